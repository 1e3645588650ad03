//! Canned manifest documents used across test suites.

/// One application with one VM and nothing else declared.
pub const MINIMAL: &str = r#"
applications:
- name: unittest
  vms:
  - name: vm1
    image: ubuntu1204
"#;

/// Short-hand keys on a VM without a `tasks:` list.
pub const SHORTHAND: &str = r#"
applications:
- name: unittest
  vms:
  - name: vm1
    image: ubuntu1204
    sysinit: ["apt-get update", "apt-get -y install python-nose"]
    execute: ["nosetests"]
"#;

/// Two applications, one from scratch and one from a blueprint.
pub const MULTI_APP: &str = r#"
applications:
- name: unittest
  keepalive: 30
  vms:
  - name: web
    image: ubuntu1204
    smp: 2
    memory: 2048
    services: [80, ssh]
  - name: db
    image: fedora17
    services: [postgresql]
    tasks:
    - name: execute
      commands: ["pg_ctl status"]
    - name: report
      class: acme.tasks.Report
      format: junit
- name: acceptance
  blueprint: acceptance-bp
  vms:
  - name: frontend
"#;

/// Two applications sharing one name.
pub const DUPLICATE_APPS: &str = r#"
applications:
- name: unittest
  vms:
  - name: vm1
    image: ubuntu1204
- name: unittest
  vms:
  - name: vm1
    image: ubuntu1204
"#;
