//! Core library for jbtimporter
//!
//! This crate implements the **Functional Core** of the BugTrack to Jira importer,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`jbtimporter_core`** (this crate): parsing, classification and local file handling
//! - **`jbtimporter`**: network I/O, the style-sheet engine and orchestration (the Imperative Shell)
//!
//! Nothing in this crate talks to the network. The only side effects are the
//! local filesystem operations of [`manifest::read_index`] and the [`lifecycle`]
//! module, which are exercised against temporary directories in tests.
//!
//! # Module Organization
//!
//! - [`issue`]: the issue descriptor produced for every primary file in an export
//! - [`manifest`]: parsing of the export's `index.xml`
//! - [`lifecycle`]: the original / transformed / reverted file states and their transitions
//! - [`charmap`]: re-encoding of extended characters as character references
//! - [`jelly`]: scanning of the Jelly runner HTML pages (token and script outcome)
//! - [`outcome`]: classification of import results and run summaries
//! - [`config`]: run mode selection and configuration normalization
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use jbtimporter_core::manifest::parse_manifest;
//!
//! let xml = r#"<bugs><bug id="100" base="2010/01"><file primary="true">details.xml</file></bug></bugs>"#;
//! let issues = parse_manifest(xml, "/exports").unwrap();
//!
//! assert_eq!(issues.len(), 1);
//! assert_eq!(issues[0].full_path_string(), "/exports/2010/01/details.xml");
//! ```

pub mod charmap;
pub mod config;
pub mod issue;
pub mod jelly;
pub mod lifecycle;
pub mod manifest;
pub mod outcome;
