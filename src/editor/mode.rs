/// Editor modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Regular editing; the prefix-key machinery rides on top of this
    Edit,
    /// Interactive help list for the active prefix mode
    Help,
}
