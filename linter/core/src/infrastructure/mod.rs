// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod content_store;
pub mod exceptions_loader;
pub mod manifest_parser;
pub mod metadata_reader;
pub mod network;

pub use content_store::OstreeContentStore;
pub use manifest_parser::ManifestParser;
pub use metadata_reader::KeyFileMetadataReader;
pub use network::{DnsRegistrationChecker, HttpCatalog, NetworkReachability};
