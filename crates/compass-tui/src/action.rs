//! Action enum — all user-initiated intents and internal events.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    SearchBar,
    TagCloud,
    Recommendations,
    HelpOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Search ───────────────────────────────────────────────────────────────
    /// Submit the text currently in the search field.
    Submit(String),
    /// Search for a single clicked tag; the field shows the tag afterwards.
    SearchTerm(String),
    CancelSearch,

    // ── Preview ──────────────────────────────────────────────────────────────
    TogglePreview(usize), // card index

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleHelp,
    ToggleKeys,
    CopyToClipboard(String),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Noop,
}
