use ratatui::style::Color;

/// Food-security resilience tier assigned to a district
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    VeryVulnerable,
    Vulnerable,
    SomewhatResilient,
    Resilient,
    VeryResilient,
}

/// Cluster id -> category. Ids 2 and 5 both landed in the top tier.
const CLUSTER_CATEGORIES: [Category; 6] = [
    Category::Vulnerable,
    Category::SomewhatResilient,
    Category::VeryResilient,
    Category::VeryVulnerable,
    Category::Resilient,
    Category::VeryResilient,
];

/// Map fill per cluster id
const CLUSTER_COLORS: [Color; 6] = [
    Color::Rgb(0xf4, 0xa2, 0x61),
    Color::Rgb(0x52, 0xb6, 0x9a),
    Color::Rgb(0x2d, 0x6a, 0x4f),
    Color::Rgb(0xd6, 0x28, 0x28),
    Color::Rgb(0xf4, 0xd3, 0x5e),
    Color::Rgb(0x26, 0x46, 0x53),
];

/// Fill for regions without a cluster (or with an id outside the table)
pub const UNMAPPED_COLOR: Color = Color::Rgb(0xcc, 0xcc, 0xcc);

/// Background for category cells that carry no known category
pub const NO_CATEGORY_COLOR: Color = Color::Rgb(0xff, 0xff, 0xff);

impl Category {
    pub const ALL: [Category; 5] = [
        Category::VeryVulnerable,
        Category::Vulnerable,
        Category::SomewhatResilient,
        Category::Resilient,
        Category::VeryResilient,
    ];

    /// Look up the category for a cluster id
    pub fn from_cluster(cluster: u8) -> Option<Self> {
        CLUSTER_CATEGORIES.get(cluster as usize).copied()
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Category::VeryVulnerable => "Very Vulnerable",
            Category::Vulnerable => "Vulnerable",
            Category::SomewhatResilient => "Somewhat Resilient",
            Category::Resilient => "Resilient",
            Category::VeryResilient => "Very Resilient",
        }
    }

    /// Label as written in the Indonesian source spreadsheets
    pub fn local_label(self) -> &'static str {
        match self {
            Category::VeryVulnerable => "Sangat Rentan",
            Category::Vulnerable => "Rentan",
            Category::SomewhatResilient => "Agak Tahan",
            Category::Resilient => "Tahan",
            Category::VeryResilient => "Sangat Tahan",
        }
    }

    /// Parse either the English or the Indonesian label, ignoring case and
    /// surrounding whitespace
    pub fn parse(text: &str) -> Option<Self> {
        let wanted = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL.into_iter().find(|category| {
            category.label().eq_ignore_ascii_case(&wanted)
                || category.local_label().eq_ignore_ascii_case(&wanted)
        })
    }

    /// Background color used for this category in tables and the pie chart
    pub fn color(self) -> Color {
        match self {
            Category::VeryVulnerable => Color::Rgb(0xd6, 0x28, 0x28),
            Category::Vulnerable => Color::Rgb(0xf4, 0xa2, 0x61),
            Category::SomewhatResilient => Color::Rgb(0x52, 0xb6, 0x9a),
            Category::Resilient => Color::Rgb(0xf4, 0xd3, 0x5e),
            Category::VeryResilient => Color::Rgb(0x26, 0x46, 0x53),
        }
    }
}

/// Map fill color for a (possibly absent) cluster id
pub fn cluster_color(cluster: Option<u8>) -> Color {
    cluster
        .and_then(|id| CLUSTER_COLORS.get(id as usize).copied())
        .unwrap_or(UNMAPPED_COLOR)
}

/// Background color for a (possibly absent) category cell
pub fn category_color(category: Option<Category>) -> Color {
    category.map(Category::color).unwrap_or(NO_CATEGORY_COLOR)
}
