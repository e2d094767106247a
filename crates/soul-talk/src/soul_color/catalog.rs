//! The fixed soul-color catalog.

use serde::Serialize;

/// Two-stop gradient, as hex strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gradient {
    pub from: &'static str,
    pub to: &'static str,
}

/// One soul color with its two descriptive lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SoulColor {
    pub id: &'static str,
    pub name: &'static str,
    pub line1: &'static str,
    pub line2: &'static str,
    pub gradient: Gradient,
}

/// Used for ids that are not in the catalog.
pub const DEFAULT_GRADIENT: Gradient = Gradient {
    from: "#E8C4B8",
    to: "#D4A89F",
};

const fn color(
    id: &'static str,
    name: &'static str,
    line1: &'static str,
    line2: &'static str,
    from: &'static str,
    to: &'static str,
) -> SoulColor {
    SoulColor {
        id,
        name,
        line1,
        line2,
        gradient: Gradient { from, to },
    }
}

pub const SOUL_COLORS: [SoulColor; 16] = [
    color(
        "obsidian-violet",
        "Obsidian Violet",
        "Quietly visionary.",
        "You think in long arcs and speak only when it matters.",
        "#1a1628",
        "#7c3aed",
    ),
    color(
        "fog-blue",
        "Fog Blue",
        "Curious and inward.",
        "You explore ideas softly, letting meaning unfold over time.",
        "#9ca3af",
        "#60a5fa",
    ),
    color(
        "iron-crimson",
        "Iron Crimson",
        "Clear and commanding.",
        "You bring direction and momentum into every conversation.",
        "#4b5563",
        "#dc2626",
    ),
    color(
        "electric-gold",
        "Electric Gold",
        "Playful and sharp.",
        "You ignite ideas and keep conversations alive with possibility.",
        "#fbbf24",
        "#fde047",
    ),
    color(
        "deep-indigo",
        "Deep Indigo",
        "Reflective and intuitive.",
        "You sense what's unspoken and respond with care.",
        "#1e3a8a",
        "#4f46e5",
    ),
    color(
        "rose-quartz",
        "Rose Quartz",
        "Gentle and sincere.",
        "You lead with feeling and value emotional truth.",
        "#fbcfe8",
        "#ec4899",
    ),
    color(
        "sunlit-amber",
        "Sunlit Amber",
        "Warm and encouraging.",
        "You help others feel seen and understood.",
        "#fed7aa",
        "#f59e0b",
    ),
    color(
        "sunset-coral",
        "Sunset Coral",
        "Open and expressive.",
        "You bring warmth, curiosity, and emotional color into the room.",
        "#ff7f50",
        "#ff6b6b",
    ),
    color(
        "slate-gray",
        "Slate Gray",
        "Grounded and steady.",
        "You offer clarity through consistency and calm.",
        "#64748b",
        "#475569",
    ),
    color(
        "soft-sage",
        "Soft Sage",
        "Protective and thoughtful.",
        "You create safety through quiet presence.",
        "#a7f3d0",
        "#10b981",
    ),
    color(
        "stone-bronze",
        "Stone Bronze",
        "Structured and reliable.",
        "You anchor conversations with clarity and purpose.",
        "#cd7f32",
        "#8b6914",
    ),
    color(
        "blush-gold",
        "Blush Gold",
        "Attentive and social.",
        "You tune into others and build connection with ease.",
        "#fecdd3",
        "#f59e0b",
    ),
    color(
        "steel-blue",
        "Steel Blue",
        "Calm and precise.",
        "You observe carefully and act with intention.",
        "#7b8fa3",
        "#3b82f6",
    ),
    color(
        "lavender-mist",
        "Lavender Mist",
        "Sensitive and present.",
        "You notice beauty and emotion in subtle moments.",
        "#e9d5ff",
        "#a78bfa",
    ),
    color(
        "ember-red",
        "Ember Red",
        "Bold and immediate.",
        "You bring energy and aliveness into the now.",
        "#fca5a5",
        "#dc2626",
    ),
    color(
        "golden-peach",
        "Golden Peach",
        "Warm and radiant.",
        "You invite joy, openness, and shared experience.",
        "#ffdab9",
        "#ffb347",
    ),
];

pub fn all() -> &'static [SoulColor] {
    &SOUL_COLORS
}

pub fn lookup(id: &str) -> Option<&'static SoulColor> {
    SOUL_COLORS.iter().find(|c| c.id == id)
}

pub fn is_valid(id: &str) -> bool {
    lookup(id).is_some()
}

pub fn gradient_for(id: &str) -> Gradient {
    lookup(id).map(|c| c.gradient).unwrap_or(DEFAULT_GRADIENT)
}

/// Catalog as a prompt bullet list: `- id: Name - line1 line2`
pub fn prompt_list() -> String {
    SOUL_COLORS
        .iter()
        .map(|c| format!("- {}: {} - {} {}", c.id, c.name, c.line1, c.line2))
        .collect::<Vec<_>>()
        .join("\n")
}
