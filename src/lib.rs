//! NVIDIA NIM vision client
//!
//! Orchestrates two hosted models on NVIDIA Cloud Functions: Grounding DINO
//! object detection (asset upload, job submission, status polling and
//! artifact unpacking) and NeVA-22B image description over a streamed chat
//! completion. A thin axum adapter exposes both flows per user session.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
