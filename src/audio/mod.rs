//! # Audio Module
//!
//! Per-guild playback state for Open Jukebox.
//!
//! ## Architecture
//!
//! ### [`queue`] - Queue Entries
//! - [`queue::QueueEntry`] pairs a resolved track with its request provenance
//! - [`queue::MusicQueue`] is the FIFO of pending entries
//!
//! ### [`session`] - Playback Session
//! - Owns the queue, the current entry, the playback state and the volume
//! - `Idle -> Playing <-> Paused -> Idle`, advanced by engine notifications
//!
//! ### [`registry`] - Session Registry
//! - One session per guild, created lazily and idempotently
//! - Each session sits behind its own async mutex
//!
//! ### [`sink`] / [`songbird_sink`] - Engine Boundary
//! - [`sink::AudioSink`] is everything a session asks of the audio engine
//! - The songbird implementation reports track ends over a channel
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let registry = SessionRegistry::new(factory, 100);
//! let session = registry.get_or_create(guild_id);
//! session.lock().await.enqueue(entry).await?;
//! ```

pub mod queue;
pub mod registry;
pub mod session;
pub mod sink;
pub mod songbird_sink;
