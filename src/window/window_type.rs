//! Window type hints (EWMH _NET_WM_WINDOW_TYPE names sent by the server).

/// Window type hint applied to the local platform window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowTypeHint {
    Normal,
    Dialog,
    Menu,
    Toolbar,
    Splashscreen,
    Utility,
    Dock,
    Desktop,
    DropdownMenu,
    PopupMenu,
    Tooltip,
    Notification,
    Combo,
    Dnd,
}

/// Known names, in lookup order
const NAME_TO_HINT: [(&str, WindowTypeHint); 14] = [
    ("_NET_WM_WINDOW_TYPE_NORMAL", WindowTypeHint::Normal),
    ("_NET_WM_WINDOW_TYPE_DIALOG", WindowTypeHint::Dialog),
    ("_NET_WM_WINDOW_TYPE_MENU", WindowTypeHint::Menu),
    ("_NET_WM_WINDOW_TYPE_TOOLBAR", WindowTypeHint::Toolbar),
    ("_NET_WM_WINDOW_TYPE_SPLASH", WindowTypeHint::Splashscreen),
    ("_NET_WM_WINDOW_TYPE_UTILITY", WindowTypeHint::Utility),
    ("_NET_WM_WINDOW_TYPE_DOCK", WindowTypeHint::Dock),
    ("_NET_WM_WINDOW_TYPE_DESKTOP", WindowTypeHint::Desktop),
    ("_NET_WM_WINDOW_TYPE_DROPDOWN_MENU", WindowTypeHint::DropdownMenu),
    ("_NET_WM_WINDOW_TYPE_POPUP_MENU", WindowTypeHint::PopupMenu),
    ("_NET_WM_WINDOW_TYPE_TOOLTIP", WindowTypeHint::Tooltip),
    ("_NET_WM_WINDOW_TYPE_NOTIFICATION", WindowTypeHint::Notification),
    ("_NET_WM_WINDOW_TYPE_COMBO", WindowTypeHint::Combo),
    ("_NET_WM_WINDOW_TYPE_DND", WindowTypeHint::Dnd),
];

impl WindowTypeHint {
    pub fn from_name(name: &str) -> Option<Self> {
        NAME_TO_HINT
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, hint)| *hint)
    }

    /// First recognised name wins; unknown names are skipped
    pub fn first_known<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<(&'a str, Self)> {
        names
            .into_iter()
            .find_map(|name| Self::from_name(name).map(|hint| (name, hint)))
    }

    /// Window types that paint the "not responding" spinner
    pub fn can_have_spinner(&self) -> bool {
        matches!(self, Self::Normal | Self::Dialog | Self::Splashscreen)
    }
}
