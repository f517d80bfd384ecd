//! Deterministic demographic text for synthetic customers.
//!
//! Names follow the drawn gender; locations are real (city, state) pairs.
//! Same RNG stream = same names.

use crate::rng::StreamRng;

pub struct NameGenerator;

impl NameGenerator {
    /// "First Last", with the first name drawn from the list for `gender`.
    pub fn full_name(rng: &mut StreamRng, gender: &str) -> String {
        let first = match gender {
            "F" => rng.pick(FEMALE_FIRST_NAMES),
            _ => rng.pick(MALE_FIRST_NAMES),
        };
        let last = rng.pick(LAST_NAMES);
        format!("{first} {last}")
    }

    /// A (city, state abbreviation) pair.
    pub fn location(rng: &mut StreamRng) -> (&'static str, &'static str) {
        *rng.pick(LOCATIONS)
    }
}

const FEMALE_FIRST_NAMES: &[&str] = &[
    "Abigail", "Alicia", "Amara", "Beatriz", "Carmen", "Chloe", "Dana", "Denise",
    "Elena", "Fatima", "Grace", "Hana", "Imani", "Ingrid", "Jasmine", "Joanna",
    "Keiko", "Laila", "Lucia", "Maya", "Monique", "Nadia", "Noor", "Olivia",
    "Priya", "Quinn", "Rosa", "Ruth", "Sofia", "Tamara", "Valerie", "Yesenia",
];

const MALE_FIRST_NAMES: &[&str] = &[
    "Aaron", "Ahmed", "Andre", "Ben", "Carlos", "Darius", "Diego", "Eli",
    "Felix", "Gabriel", "Hiroshi", "Isaac", "Jamal", "Jonah", "Kenji", "Liam",
    "Luis", "Marcus", "Mateo", "Nikhil", "Omar", "Owen", "Pedro", "Rafael",
    "Samuel", "Tariq", "Theo", "Victor", "Wesley", "Xavier", "Yusuf", "Zane",
];

const LAST_NAMES: &[&str] = &[
    "Abbott", "Alvarez", "Baptiste", "Brennan", "Castillo", "Chowdhury", "Delgado", "Dubois",
    "Ellison", "Fitzgerald", "Friedman", "Gallagher", "Haddad", "Horvath", "Ibarra", "Jensen",
    "Kaur", "Kowalski", "Lindqvist", "Mbeki", "Moreau", "Nakamura", "Novak", "Okafor",
    "Osei", "Pereira", "Quintero", "Rasmussen", "Sato", "Schneider", "Tanaka", "Underwood",
    "Varga", "Whitaker", "Yamamoto", "Zhang",
];

const LOCATIONS: &[(&str, &str)] = &[
    ("Albuquerque", "NM"), ("Atlanta", "GA"), ("Austin", "TX"), ("Baltimore", "MD"),
    ("Boise", "ID"), ("Boston", "MA"), ("Charlotte", "NC"), ("Chicago", "IL"),
    ("Cleveland", "OH"), ("Columbus", "OH"), ("Denver", "CO"), ("Des Moines", "IA"),
    ("Detroit", "MI"), ("El Paso", "TX"), ("Fresno", "CA"), ("Honolulu", "HI"),
    ("Indianapolis", "IN"), ("Kansas City", "MO"), ("Las Vegas", "NV"), ("Louisville", "KY"),
    ("Memphis", "TN"), ("Miami", "FL"), ("Milwaukee", "WI"), ("Minneapolis", "MN"),
    ("Nashville", "TN"), ("New Orleans", "LA"), ("Oakland", "CA"), ("Omaha", "NE"),
    ("Philadelphia", "PA"), ("Phoenix", "AZ"), ("Pittsburgh", "PA"), ("Portland", "OR"),
    ("Providence", "RI"), ("Raleigh", "NC"), ("Richmond", "VA"), ("Sacramento", "CA"),
    ("Salt Lake City", "UT"), ("San Antonio", "TX"), ("Seattle", "WA"), ("Spokane", "WA"),
    ("Tampa", "FL"), ("Tucson", "AZ"), ("Tulsa", "OK"), ("Wichita", "KS"),
];
