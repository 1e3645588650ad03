//! Service declarations on a VM

use crate::model::Service;

/// Well-known TCP services that may be named instead of given by port.
const WELL_KNOWN: &[(&str, u16)] = &[
    ("ftp", 21),
    ("ssh", 22),
    ("telnet", 23),
    ("smtp", 25),
    ("dns", 53),
    ("domain", 53),
    ("http", 80),
    ("pop3", 110),
    ("imap", 143),
    ("ldap", 389),
    ("https", 443),
    ("mysql", 3306),
    ("rdp", 3389),
    ("postgresql", 5432),
    ("amqp", 5672),
    ("vnc", 5900),
    ("redis", 6379),
    ("http-alt", 8080),
    ("memcached", 11211),
    ("mongodb", 27017),
];

/// Standard port of a named service
pub fn port_for(name: &str) -> Option<u16> {
    WELL_KNOWN
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, port)| *port)
}

/// A service given as a bare port number is named `port-<N>`.
pub fn from_port(port: u16) -> Service {
    Service {
        name: format!("port-{}", port),
        port,
    }
}

/// A service given by name; `None` if the name is not a known service.
pub fn from_name(name: &str) -> Option<Service> {
    port_for(name).map(|port| Service {
        name: name.to_lowercase(),
        port,
    })
}
