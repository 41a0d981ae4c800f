//! CHIP-8 sound.

/// Host collaborator that turns the sound timer's state into an audible
/// tone. The core only ever calls this at the edges of ST's 1-to-0/0-to-1
/// transitions; it does not know or care how the tone is produced.
pub trait AudioInterface {
    /// Start (or keep) sounding the tone.
    fn play_beep(&mut self);

    /// Silence the tone.
    fn silence(&mut self);
}

/// Sound peripheral.
#[derive(Default)]
pub struct Sound;

impl Sound {
    /// New sound peripheral.
    pub fn new() -> Self {
        Default::default()
    }

    /// Start the beep on the given driver.
    pub fn play_beep(&self, driver: &mut dyn AudioInterface) {
        driver.play_beep()
    }

    /// Silence the beep on the given driver.
    pub fn silence(&self, driver: &mut dyn AudioInterface) {
        driver.silence()
    }
}
