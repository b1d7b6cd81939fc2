// SPDX-License-Identifier: MPL-2.0
//! `folio` is an animated, tree-structured content viewer built with the
//! Iced GUI framework.
//!
//! A hierarchical content map drives navigation: clicking a text link
//! animates the old subtree out and the selected subtree in, one node chain
//! at a time. Leaf nodes may carry an image with responsive scale-to-fit
//! sizing and an optional magnifying loupe.

#![doc(html_root_url = "https://docs.rs/folio/0.2.0")]

pub mod app;
pub mod config;
pub mod content;
pub mod error;
pub mod support;
pub mod viewer;
