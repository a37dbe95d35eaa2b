#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
/// Hardware model the console is constructed for.
///
/// Used to select the post-boot register presets and to validate requested
/// CPU features at construction time.
pub enum Model {
    #[default]
    Dmg,
    Cgb,
}

impl Model {
    #[inline]
    /// Returns whether this model supports the double-speed feature.
    pub const fn supports_double_speed(self) -> bool {
        matches!(self, Model::Cgb)
    }
}
