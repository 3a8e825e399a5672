use crate::Component;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub display_name: &'static str,
    /// g/mol
    pub molecular_weight: Option<f64>,
    pub aliases: &'static [&'static str],
}

impl CatalogEntry {
    pub fn component(&self) -> Component {
        Component::from_catalog(self.id, self.molecular_weight)
    }

    /// Exact, case-insensitive match on id, display name or alias.
    pub fn is_named(&self, name: &str) -> bool {
        let name = name.trim();
        self.id.eq_ignore_ascii_case(name)
            || self.display_name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }

    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_ascii_lowercase();
        if query.is_empty() {
            return true;
        }

        self.id.to_ascii_lowercase().contains(&query)
            || self.display_name.to_ascii_lowercase().contains(&query)
            || self
                .aliases
                .iter()
                .any(|alias| alias.to_ascii_lowercase().contains(&query))
    }
}

const BUILTIN_CATALOG: [CatalogEntry; 9] = [
    CatalogEntry {
        id: "oleic_acid",
        display_name: "Oleic Acid",
        molecular_weight: Some(282.47),
        aliases: &["oleic"],
    },
    CatalogEntry {
        id: "ethanol",
        display_name: "Ethanol",
        molecular_weight: Some(46.07),
        aliases: &["etoh"],
    },
    CatalogEntry {
        id: "dodecanoic_acid",
        display_name: "Dodecanoic Acid",
        molecular_weight: Some(200.32),
        aliases: &["lauric acid"],
    },
    CatalogEntry {
        id: "octanoic_acid",
        display_name: "Octanoic Acid",
        molecular_weight: Some(144.21),
        aliases: &["caprylic acid"],
    },
    CatalogEntry {
        id: "geranic_acid",
        display_name: "Geranic Acid",
        molecular_weight: Some(168.23),
        aliases: &[],
    },
    CatalogEntry {
        id: "candelilla_wax",
        display_name: "Candelilla Wax",
        molecular_weight: None,
        aliases: &["candelilla"],
    },
    CatalogEntry {
        id: "light_mineral_oil",
        display_name: "Light Mineral Oil",
        molecular_weight: Some(425.363),
        aliases: &[],
    },
    CatalogEntry {
        id: "heavy_mineral_oil",
        display_name: "Heavy Mineral Oil",
        molecular_weight: Some(452.363),
        aliases: &[],
    },
    CatalogEntry {
        id: "water",
        display_name: "Water",
        molecular_weight: Some(18.015),
        aliases: &["h2o"],
    },
];

pub fn builtin_catalog() -> &'static [CatalogEntry] {
    &BUILTIN_CATALOG
}

pub fn search_catalog(query: &str) -> Vec<CatalogEntry> {
    builtin_catalog()
        .iter()
        .copied()
        .filter(|entry| entry.matches_query(query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let mut seen = HashSet::new();
        for entry in builtin_catalog() {
            assert!(seen.insert(entry.id), "duplicate id: {}", entry.id);
        }
    }

    #[test]
    fn search_finds_mineral_oils() {
        let results = search_catalog("mineral");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn empty_query_lists_everything() {
        assert_eq!(search_catalog("").len(), builtin_catalog().len());
    }
}
