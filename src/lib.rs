//! smart-suggest: terminal document editor with AI sentence suggestions
//!
//! Documents are imported from Word files, edited as HTML source, and
//! exported to PDF or Word. Selected text is sent to a suggestion service
//! over a websocket and the correction can replace the selection.

pub mod app;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod html;
pub mod import;
pub mod jobs;
pub mod notification;
pub mod suggest;
pub mod widgets;
