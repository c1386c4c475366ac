use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Maximum number of suggestions returned for one lookup.
pub const MAX_SUGGESTIONS: usize = 25;

/// Drivetrain class a score is recorded under.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    #[serde(rename = "RWD")]
    #[strum(serialize = "RWD")]
    Rwd,
    #[serde(rename = "AWD")]
    #[strum(serialize = "AWD")]
    Awd,
    #[serde(rename = "FWD")]
    #[strum(serialize = "FWD")]
    Fwd,
}

impl Category {
    pub fn all() -> impl Iterator<Item = Category> {
        Category::iter()
    }
}

const TRACKS: &[(&str, &[&str])] = &[
    ("Brands Hatch", &["Grand Prix Circuit", "Indy Circuit"]),
    (
        "Circuit de Barcelona-Catalunya",
        &["Grand Prix Circuit", "National Circuit", "National Circuit Alt"],
    ),
    ("Circuit de Spa-Francorchamps", &["Full Circuit"]),
    (
        "Daytona International Speedway",
        &["Sport Car Circuit", "Tri-Oval Circuit"],
    ),
    (
        "Eaglerock Speedway",
        &["Oval Circuit", "Clubs Circuit", "Clubs Circuit Reverse"],
    ),
    ("Fujimi Kaido", &["Fujimi Circuit", "Fujimi Circuit Reverse"]),
    (
        "Grand Oak Raceway",
        &["National Circuit", "Clubs Circuit", "National Circuit Reverse"],
    ),
    (
        "Hakone",
        &["Grand Prix Circuit", "Club Circuit", "Club Circuit Reverse"],
    ),
    (
        "Hockenheimring",
        &["Full Circuit", "National Circuit", "Short Circuit"],
    ),
    ("Homestead-Miami Speedway", &["Speedway Circuit", "Road Circuit"]),
    (
        "Indianapolis Motor Speedway",
        &["The Brickyard Speedway", "Grand Prix Circuit"],
    ),
    ("Kyalami Grand Prix Circuit", &["Grand Prix Circuit"]),
    (
        "Le Mans - Circuit International de la Sarthe",
        &["Full Circuit", "Old Musanne Circuit"],
    ),
    (
        "Lime Rock Park",
        &["Full Circuit", "South Chicane", "Full Circuit Alt"],
    ),
    (
        "Maple Valley",
        &["Full Circuit", "Short Circuit", "Short Circuit Reverse"],
    ),
    (
        "Michelin Raceway Road Atlanta",
        &["Grand Prix Course", "Short Course"],
    ),
    (
        "Mid-Ohio Sports Car Course",
        &["Sports Car Circuit", "Short Circuit"],
    ),
    ("Mount Panorama Circuit", &["Bathurst"]),
    ("Mugello Circuit", &["Full Circuit", "Club Circuit"]),
    (
        "Nürburgring",
        &["Full Circuit", "Nordschleife", "GP Circuit", "Sprint Circuit"],
    ),
    ("Road America", &["Full Circuit", "Easte Route"]),
    ("Sebring International Raceway", &["Full Circuit", "Short Circuit"]),
    (
        "Silverstone Circuit",
        &["Grand Prix Circuit", "National Circuit", "International Circuit"],
    ),
    (
        "Sunset Peninsula Raceway",
        &[
            "Full Circuit",
            "Club Circuit",
            "Full Circuit Reverse",
            "Club Circuit Reverse",
            "Speedway",
        ],
    ),
    ("Suzuka Circuit", &["Full Circuit", "East Route"]),
    (
        "Virginia International Raceway",
        &["Full", "North", "South", "Grand West", "Grand East"],
    ),
    (
        "Watkins Glen International Speedway",
        &["Full Circuit", "Short Circuit"],
    ),
    (
        "WeatherTech Raceway Laguna Seca",
        &["Full Circuit", "Short Circuit"],
    ),
    (
        "Yas Marina Circuit",
        &["Full Circuit", "North Circuit", "South Circuit", "North Corkscrew"],
    ),
];

#[derive(Debug, Clone)]
struct Course {
    name: String,
    variants: Vec<String>,
}

/// Static reference data: the categories and every course with its variants.
///
/// Built once at startup and shared read-only, so it needs no locking.
#[derive(Debug, Clone)]
pub struct Catalog {
    courses: Vec<Course>,
}

impl Catalog {
    /// The reference track table.
    pub fn builtin() -> Self {
        Self::from_table(TRACKS)
    }

    pub fn from_table(table: &[(&str, &[&str])]) -> Self {
        let courses = table
            .iter()
            .map(|(name, variants)| Course {
                name: name.to_string(),
                variants: variants.iter().map(|v| v.to_string()).collect(),
            })
            .collect();
        Catalog { courses }
    }

    fn course(&self, name: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.name == name)
    }

    pub fn is_valid_category(&self, category: &str) -> bool {
        category.parse::<Category>().is_ok()
    }

    pub fn is_valid_course(&self, course: &str) -> bool {
        self.course(course).is_some()
    }

    /// False when the course is unknown or does not offer `variant`.
    pub fn is_valid_variant(&self, course: &str, variant: &str) -> bool {
        self.course(course)
            .map(|c| c.variants.iter().any(|v| v == variant))
            .unwrap_or(false)
    }

    pub fn list_categories(&self) -> Vec<Category> {
        Category::all().collect()
    }

    pub fn list_courses(&self) -> Vec<&str> {
        self.courses.iter().map(|c| c.name.as_str()).collect()
    }

    /// Empty when the course is unknown.
    pub fn list_variants(&self, course: &str) -> Vec<&str> {
        self.course(course)
            .map(|c| c.variants.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn suggest_categories(&self, fragment: &str) -> Vec<String> {
        filter_fragment(
            Category::all().map(|c| c.as_ref().to_string()),
            fragment,
        )
    }

    pub fn suggest_courses(&self, fragment: &str) -> Vec<String> {
        filter_fragment(self.courses.iter().map(|c| c.name.clone()), fragment)
    }

    pub fn suggest_variants(&self, course: &str, fragment: &str) -> Vec<String> {
        filter_fragment(
            self.list_variants(course).into_iter().map(str::to_string),
            fragment,
        )
    }
}

fn filter_fragment(candidates: impl Iterator<Item = String>, fragment: &str) -> Vec<String> {
    let needle = fragment.to_lowercase();
    candidates
        .filter(|c| c.to_lowercase().contains(&needle))
        .take(MAX_SUGGESTIONS)
        .collect()
}
