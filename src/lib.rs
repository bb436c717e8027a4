//! Clipstack - Automated Short-Video Workflow
//!
//! Downloads or imports a video, trims it, captions it with whisper, burns the
//! captions in with ffmpeg, and lays it out for vertical short-form platforms.

pub mod cli;
pub mod config;
pub mod workflow;
pub mod transcribe;
pub mod subtitle;
pub mod media;
pub mod download;
pub mod error;
pub mod setup;
