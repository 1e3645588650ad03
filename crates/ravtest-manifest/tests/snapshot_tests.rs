//! Snapshots of the `lint --dump` rendering of expanded manifests.

use ravtest_manifest::{DefaultManifest, Language, Resolver, UserManifest};
use ravtest_test_utils::manifests;

fn dump(yaml: &str, language: Language) -> String {
    let manifest = UserManifest::parse(yaml).unwrap();
    Resolver::new(DefaultManifest::builtin().unwrap())
        .resolve(&manifest, &language)
        .unwrap()
        .to_yaml()
        .unwrap()
}

#[test]
fn snapshot_minimal_manifest_dump() {
    insta::assert_snapshot!(dump(manifests::MINIMAL, Language::NoDefaults), @r###"
    language: nodefaults
    applications:
    - name: unittest
      keepalive: 50
      vms:
      - name: vm1
        image: ubuntu1204
        tasks:
        - name: deploy
          class: ravtest.tasks.DeployTask
          commands: []
          quiet: true
        - name: sysinit
          class: ravtest.tasks.SysinitTask
          commands: []
          user: root
          quiet: false
        - name: prepare
          class: ravtest.tasks.ShellTask
          commands: []
          quiet: false
        - name: execute
          class: ravtest.tasks.ShellTask
          commands: []
          quiet: false
    "###);
}

#[test]
fn snapshot_shorthand_python_dump() {
    insta::assert_snapshot!(dump(manifests::SHORTHAND, Language::named("python")), @r###"
    language: python
    applications:
    - name: unittest
      keepalive: 50
      vms:
      - name: vm1
        image: ubuntu1204
        tasks:
        - name: deploy
          class: ravtest.tasks.DeployTask
          commands: []
          quiet: true
        - name: sysinit
          class: ravtest.tasks.SysinitTask
          commands:
          - apt-get update
          - apt-get -y install python-nose
          user: root
          quiet: false
        - name: prepare
          class: ravtest.tasks.ShellTask
          commands:
          - python setup.py build
          quiet: false
        - name: execute
          class: ravtest.tasks.ShellTask
          commands:
          - nosetests
          quiet: false
    "###);
}

#[test]
fn dump_has_no_shorthand_keys() {
    let output = dump(manifests::SHORTHAND, Language::NoDefaults);
    let value: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
    let vm = &value["applications"][0]["vms"][0];
    assert!(vm.get("sysinit").is_none());
    assert!(vm.get("execute").is_none());
    assert!(vm.get("tasks").is_some());
}
