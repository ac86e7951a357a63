/// The source location of the check that raised an error.
pub type Blame = &'static std::panic::Location<'static>;

/// Capture the caller's location; callers should be `#[track_caller]`.
#[track_caller]
pub fn blame() -> Blame {
    std::panic::Location::caller()
}
