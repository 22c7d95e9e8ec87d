//! Output style roles
//!
//! Each logical style is a variant of [`StyleRole`] mapped to an optional `colored::Color`.
//! Colouring only happens when the caller passes `enabled = true`, so there is no global
//! colour state to reset in tests.
//!
//! ```
//! use surfacewatch::core::styles::StyleRole;
//! assert_eq!(StyleRole::Header.paint("Tool", false), "Tool");
//! ```

use clap::builder::styling::AnsiColor;
use colored::Color;

macro_rules! style {
    ( $( $variant:ident => $color:expr ),+ $(,)? ) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub enum StyleRole { $( $variant ),+ }

        impl StyleRole {
            pub fn color(self) -> Option<Color> {
                match self { $( StyleRole::$variant => $color ),+ }
            }
        }
    }
}

style! {
    Header   => Some(Color::Yellow),
    Literal  => Some(Color::Cyan),
    Key      => Some(Color::BrightGreen),
    Value    => None,
    Dim      => Some(Color::BrightBlack),
    Success  => Some(Color::Green),
    Progress => Some(Color::Blue),
    Failure  => Some(Color::BrightRed),
    Warning  => Some(Color::Yellow),
}

impl StyleRole {
    pub fn paint(self, text: &str, enabled: bool) -> String {
        use colored::Colorize;

        match self.color() {
            Some(color) if enabled => text.color(color).to_string(),
            _ => text.to_string(),
        }
    }

    /// Foreground spec for a prettytable cell, e.g. `Fy`
    pub fn table_spec(self, enabled: bool) -> String {
        if !enabled {
            return String::new();
        }
        let spec = match self.color() {
            Some(Color::Red) => "Fr",
            Some(Color::Green) => "Fg",
            Some(Color::Yellow) => "Fy",
            Some(Color::Blue) => "Fb",
            Some(Color::Cyan) => "Fc",
            Some(Color::BrightBlack) => "FK",
            Some(Color::BrightRed) => "FR",
            Some(Color::BrightGreen) => "FG",
            _ => "",
        };
        spec.to_string()
    }
}

fn color_to_ansi(c: Color) -> Option<AnsiColor> {
    Some(match c {
        Color::Red => AnsiColor::Red,
        Color::Green => AnsiColor::Green,
        Color::Yellow => AnsiColor::Yellow,
        Color::Blue => AnsiColor::Blue,
        Color::Cyan => AnsiColor::Cyan,
        Color::BrightBlack => AnsiColor::BrightBlack,
        Color::BrightRed => AnsiColor::BrightRed,
        Color::BrightGreen => AnsiColor::BrightGreen,
        _ => return None,
    })
}

/// clap help styles built from the same roles
pub fn palette_to_clap(enabled: bool) -> clap::builder::Styles {
    use clap::builder::styling::{Color as ClapColor, Style};
    if !enabled {
        return clap::builder::Styles::plain();
    }

    let style = |role: StyleRole, bold: bool| {
        let mut s = Style::new();
        if let Some(col) = role.color().and_then(color_to_ansi) {
            s = s.fg_color(Some(ClapColor::Ansi(col)));
        }
        if bold {
            s = s.bold();
        }
        s
    };

    clap::builder::Styles::styled()
        .header(style(StyleRole::Header, true))
        .usage(style(StyleRole::Header, true))
        .literal(style(StyleRole::Literal, false))
        .placeholder(style(StyleRole::Key, false))
        .error(style(StyleRole::Failure, true))
        .invalid(style(StyleRole::Warning, false))
}
