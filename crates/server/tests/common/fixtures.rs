//! Test fixtures: node configurations, archives and multipart bodies.

use ledgerweb_core::config::{AppConfig, MemoryNodeConfig, NodeConfig};
use ledgerweb_core::{NodeName, PartyName};
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "ledgerweb-test-boundary";

/// Parse a party name, panicking on invalid test input.
#[allow(dead_code)]
pub fn party(text: &str) -> PartyName {
    PartyName::parse(text).expect("valid party name")
}

#[allow(dead_code)]
pub fn node_name(name: &str) -> NodeName {
    NodeName::new(name).expect("valid node name")
}

/// In-memory node config for `identity`.
#[allow(dead_code)]
pub fn memory_node(identity: &str) -> MemoryNodeConfig {
    MemoryNodeConfig::new(party(identity))
}

/// Two online nodes, `partyA` and `partyB`, and no `cordform` sentinel.
#[allow(dead_code)]
pub fn network_config() -> AppConfig {
    let mut party_a = memory_node("O=PartyA, L=London, C=GB");
    party_a.peers = vec![party("O=PartyB, L=New York, C=US")];
    party_a.notaries = vec![party("O=Notary, L=London, C=GB")];
    party_a.flows = vec!["com.example.IssueFlow".to_string()];
    party_a.addresses = vec!["localhost:10005".parse().expect("valid address")];

    let mut party_b = memory_node("O=PartyB, L=New York, C=US");
    party_b.peers = vec![party("O=PartyA, L=London, C=GB")];
    party_b.platform_version = 5;

    let mut config = AppConfig::default();
    config
        .nodes
        .insert(node_name("partyA"), NodeConfig::Memory(party_a));
    config
        .nodes
        .insert(node_name("partyB"), NodeConfig::Memory(party_b));
    config
}

/// Build a stored ZIP archive; names ending in `/` become directories.
#[allow(dead_code)]
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Read every file entry of an archive as `(name, content)`.
#[allow(dead_code)]
pub fn unzip(data: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(data)).expect("valid archive");
    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).unwrap();
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        entries.push((file.name().to_string(), content));
    }
    entries
}

/// Encode `file` parts and an optional `uploader` part as multipart/form-data.
///
/// Returns the content type header value and the body.
#[allow(dead_code)]
pub fn multipart_body(files: &[(&str, &[u8])], uploader: Option<&str>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (filename, content) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(uploader) = uploader {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"uploader\"\r\n\r\n{uploader}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
