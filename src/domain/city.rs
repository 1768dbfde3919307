// City domain model

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City {
    pub id: String,
    pub name: String,
}

impl City {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let name = Self::format_name(&id);
        Self { id, name }
    }

    fn format_name(id: &str) -> String {
        // "3" -> "City 3", "New_York_" -> "New York"
        if id.parse::<f64>().is_ok() {
            format!("City {id}")
        } else {
            id.trim_end_matches('_').replace('_', " ")
        }
    }
}

/// Order city ids numerically when every id is a number, lexicographically otherwise.
pub fn sort_city_ids(ids: &mut [String]) {
    if ids.iter().all(|id| id.parse::<f64>().is_ok()) {
        ids.sort_by(|a, b| {
            let a: f64 = a.parse().unwrap_or_default();
            let b: f64 = b.parse().unwrap_or_default();
            a.total_cmp(&b)
        });
    } else {
        ids.sort();
    }
}
