//! Maven repository protocol for publishing: POM rendering and parsing,
//! repository layout, credentials, upload transports, checksum sidecars,
//! and `maven-metadata.xml` maintenance.

pub mod auth;
pub mod checksum;
pub mod metadata;
pub mod pom;
pub mod repository;
pub mod transport;

mod xml;
