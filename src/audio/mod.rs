//! Audio output and analysis plumbing.
//!
//! The playback path pushes every frame it writes to the device into an
//! [`AudioTap`] ring so the amplitude lip-sync driver can analyse the
//! signal actually being heard, without a second decode.

pub mod decode;
pub mod playback;
pub mod tap;

pub use decode::{DecodedAudio, decode_bytes};
pub use playback::{AudioOutput, CpalPlayback, PlaybackEvent, PlaybackHandle};
pub use tap::AudioTap;
