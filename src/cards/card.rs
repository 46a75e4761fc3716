//! Card model: colors, faces, categories.
//!
//! A `Card` is immutable once created. Its category and point value are
//! derived from the face, so a card can never disagree with itself.

use serde::{Deserialize, Serialize};

use crate::core::ids::CardId;

/// One of the four real colors. Wild cards have no color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Yellow,
    Green,
    Blue,
}

impl Color {
    /// All real colors in deck order.
    pub const ALL: [Color; 4] = [Color::Red, Color::Yellow, Color::Green, Color::Blue];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Card category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Number,
    Action,
    Wild,
}

/// Face value of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Face {
    /// 0-9.
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl Face {
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Face::Number(_) => Category::Number,
            Face::Skip | Face::Reverse | Face::DrawTwo => Category::Action,
            Face::Wild | Face::WildDrawFour => Category::Wild,
        }
    }

    /// Points this face is worth when left in a losing hand.
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            Face::Number(n) => n as u32,
            Face::Skip | Face::Reverse | Face::DrawTwo => 20,
            Face::Wild | Face::WildDrawFour => 50,
        }
    }

    /// Cards the next player is forced to draw.
    #[must_use]
    pub const fn forced_draw(self) -> usize {
        match self {
            Face::DrawTwo => 2,
            Face::WildDrawFour => 4,
            _ => 0,
        }
    }

    /// Short label used in move history.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Face::Number(n) => n.to_string(),
            Face::Skip => "SKIP".to_string(),
            Face::Reverse => "REVERSE".to_string(),
            Face::DrawTwo => "+2".to_string(),
            Face::Wild => "WILD".to_string(),
            Face::WildDrawFour => "+4".to_string(),
        }
    }
}

/// A single card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// `None` only for wild-family cards.
    pub color: Option<Color>,
    pub face: Face,
}

impl Card {
    /// Create a number card.
    #[must_use]
    pub fn number(id: CardId, color: Color, value: u8) -> Self {
        debug_assert!(value <= 9, "number cards run 0-9");
        Self {
            id,
            color: Some(color),
            face: Face::Number(value),
        }
    }

    /// Create a colored action card (skip, reverse, draw-two).
    #[must_use]
    pub fn action(id: CardId, color: Color, face: Face) -> Self {
        debug_assert_eq!(face.category(), Category::Action);
        Self {
            id,
            color: Some(color),
            face,
        }
    }

    /// Create a wild-family card.
    #[must_use]
    pub fn wild(id: CardId, face: Face) -> Self {
        debug_assert_eq!(face.category(), Category::Wild);
        Self {
            id,
            color: None,
            face,
        }
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.face.category()
    }

    #[must_use]
    pub fn is_wild(&self) -> bool {
        self.category() == Category::Wild
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.face.points()
    }

    /// Color or face match against the current top card and active color.
    ///
    /// Wild-family cards always match; the wild-draw-four hand condition is
    /// checked by the rules engine, not here.
    #[must_use]
    pub fn matches(&self, top: &Card, active_color: Color) -> bool {
        self.is_wild() || self.color == Some(active_color) || self.face == top.face
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.color {
            Some(color) => write!(f, "{} {}", color, self.face.label()),
            None => f.write_str(&self.face.label()),
        }
    }
}
