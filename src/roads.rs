use crate::theme::Theme;

/// Visual class of a road, doubling as its theme color role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoadClass {
    Motorway,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Default,
}

impl RoadClass {
    pub const ALL: [RoadClass; 6] = [
        RoadClass::Motorway,
        RoadClass::Primary,
        RoadClass::Secondary,
        RoadClass::Tertiary,
        RoadClass::Residential,
        RoadClass::Default,
    ];

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "motorway" | "motorway_link" => Self::Motorway,
            "trunk" | "trunk_link" | "primary" | "primary_link" => Self::Primary,
            "secondary" | "secondary_link" => Self::Secondary,
            "tertiary" | "tertiary_link" => Self::Tertiary,
            "residential" | "living_street" | "unclassified" => Self::Residential,
            _ => Self::Default,
        }
    }

    /// Multi-valued tags take their first entry; an empty list counts as
    /// `unclassified`.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        tags.first()
            .map(|tag| Self::from_tag(tag.as_ref()))
            .unwrap_or(Self::Residential)
    }

    /// Raw OSM value; `;` separates multiple values.
    pub fn from_osm_value(value: Option<&str>) -> Self {
        match value {
            Some(value) => {
                let tags: Vec<&str> = value.split(';').filter(|s| !s.trim().is_empty()).collect();
                Self::from_tags(&tags)
            }
            None => Self::Residential,
        }
    }

    pub fn width(self) -> f32 {
        match self {
            Self::Motorway => 1.2,
            Self::Primary => 1.0,
            Self::Secondary => 0.8,
            Self::Tertiary => 0.6,
            Self::Residential | Self::Default => 0.4,
        }
    }

    pub fn color(self, theme: &Theme) -> &str {
        match self {
            Self::Motorway => &theme.road_motorway,
            Self::Primary => &theme.road_primary,
            Self::Secondary => &theme.road_secondary,
            Self::Tertiary => &theme.road_tertiary,
            Self::Residential => &theme.road_residential,
            Self::Default => &theme.road_default,
        }
    }
}

/// Color role and stroke width for a highway tag.
pub fn classify_road(tag: &str) -> (RoadClass, f32) {
    let class = RoadClass::from_tag(tag);
    (class, class.width())
}
