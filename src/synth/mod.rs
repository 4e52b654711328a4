//! Speech synthesis: the collaborator seam, the ElevenLabs client and the
//! driver that turns a timeline into measured clips.

pub mod driver;
pub mod elevenlabs;
pub mod synthesizer;

pub use driver::{SynthesisDriver, SynthesizedClip};
pub use elevenlabs::ElevenLabsSynthesizer;
pub use synthesizer::{MockSynthesizer, SpeechSynthesizer, VoiceSettings};
