use std::sync::LazyLock;

use regex::Regex;

use crate::formats::SectorReading;
use crate::patterns;

/// Elements that may describe a single sector on the stadium map.
pub const SECTOR_SELECTOR: &str = "[data-testid*=sector], [class*=sector], \
     [aria-label*='Sektor'], [aria-label*='sektor'], \
     [aria-label*='Sector'], [aria-label*='sector']";

static SECTOR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:sektor|sector)\s*(?P<name>\p{L}{1,2}[0-9]{0,2}|\p{Lu}+)\b")
        .expect("compile sector name pattern")
});

/// Text sources read from one sector-bearing element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementDescriptor {
    pub aria_label: Option<String>,
    pub title: Option<String>,
    pub inner_text: Option<String>,
}

impl ElementDescriptor {
    fn candidates(&self) -> impl Iterator<Item = &str> {
        [&self.aria_label, &self.title, &self.inner_text]
            .into_iter()
            .flatten()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
    }
}

pub fn sector_name(text: &str) -> Option<String> {
    SECTOR_NAME
        .captures(text)
        .and_then(|captures| captures.name("name"))
        .map(|name| name.as_str().to_owned())
}

/// The name and the count may come from different sources; both must be
/// present for the element to count as a sector.
pub fn read_sector(element: &ElementDescriptor) -> Option<SectorReading> {
    let sector = element.candidates().find_map(sector_name)?;
    let available = element
        .candidates()
        .find_map(|text| patterns::find_available(text).map(|m| m.count))?;
    Some(SectorReading { sector, available })
}

pub fn aggregate(elements: &[ElementDescriptor]) -> Vec<SectorReading> {
    elements.iter().filter_map(read_sector).collect()
}

/// `None` means no sector was found. A zero sum is a real reading.
pub fn sector_sum(sectors: &[SectorReading]) -> Option<u64> {
    if sectors.is_empty() {
        return None;
    }
    Some(
        sectors
            .iter()
            .fold(0_u64, |acc, sector| acc.saturating_add(sector.available)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(aria: Option<&str>, title: Option<&str>, text: Option<&str>) -> ElementDescriptor {
        ElementDescriptor {
            aria_label: aria.map(str::to_owned),
            title: title.map(str::to_owned),
            inner_text: text.map(str::to_owned),
        }
    }

    #[test]
    fn read_sector_from_aria_label() {
        let reading = read_sector(&element(Some("Sector A12, 45 available"), None, None));
        assert_eq!(
            reading,
            Some(SectorReading {
                sector: "A12".to_owned(),
                available: 45,
            })
        );
    }

    #[test]
    fn read_sector_combines_name_and_count_from_different_sources() {
        let reading = read_sector(&element(
            Some("Sektor C3"),
            Some("Wolnych miejsc: 17"),
            Some("Sektor Z9, 999 dostępnych"),
        ))
        .expect("sector");
        assert_eq!(reading.sector, "C3");
        assert_eq!(reading.available, 17);
    }

    #[test]
    fn read_sector_prefers_aria_then_title_then_text() {
        let reading = read_sector(&element(
            None,
            Some("Sektor B, dostępnych: 5"),
            Some("Sektor D, dostępnych: 6"),
        ))
        .expect("sector");
        assert_eq!(reading.sector, "B");
        assert_eq!(reading.available, 5);
    }

    #[test]
    fn read_sector_skips_empty_sources() {
        let reading = read_sector(&element(Some("  "), None, Some("Sector VIP\n3 available")))
            .expect("sector");
        assert_eq!(reading.sector, "VIP");
        assert_eq!(reading.available, 3);
    }

    #[test]
    fn element_without_count_is_excluded() {
        let elements = vec![
            element(Some("Sector A1"), None, Some("sold out soon")),
            element(Some("Sector A2, 10 available"), None, None),
            element(None, None, Some("40 available")),
        ];
        let sectors = aggregate(&elements);
        assert_eq!(
            sectors,
            vec![SectorReading {
                sector: "A2".to_owned(),
                available: 10,
            }]
        );
    }

    #[test]
    fn sector_name_accepts_codes_and_uppercase_words() {
        assert_eq!(sector_name("Sektor A12").as_deref(), Some("A12"));
        assert_eq!(sector_name("sector b").as_deref(), Some("b"));
        assert_eq!(sector_name("SEKTOR GH7").as_deref(), Some("GH7"));
        assert_eq!(sector_name("Sector VIP lounge").as_deref(), Some("VIP"));
        assert_eq!(sector_name("Sektor Ł1, 4 wolne").as_deref(), Some("Ł1"));
        assert_eq!(sector_name("sektor żb").as_deref(), Some("żb"));
        assert_eq!(sector_name("Sector North"), None);
        assert_eq!(sector_name("Trybuna wschodnia"), None);
    }

    #[test]
    fn sector_sum_distinguishes_zero_from_absent() {
        assert_eq!(sector_sum(&[]), None);

        let zero = vec![SectorReading {
            sector: "A".to_owned(),
            available: 0,
        }];
        assert_eq!(sector_sum(&zero), Some(0));

        let sectors = vec![
            SectorReading {
                sector: "A".to_owned(),
                available: 12,
            },
            SectorReading {
                sector: "B".to_owned(),
                available: 30,
            },
        ];
        assert_eq!(sector_sum(&sectors), Some(42));
    }
}
