//! Static lookup table of CFR title numbers and names.
//!
//! The bulk XML usually carries its own title heading; this table is the
//! fallback when it does not, and the canonical list of titles to process
//! when the CLI is given no subset. Loaded once, never mutated.

/// All fifty CFR titles. Index order is title-number order.
pub const TITLE_NAMES: [(u32, &str); 50] = [
    (1, "General Provisions"),
    (2, "Federal Financial Assistance"),
    (3, "The President"),
    (4, "Accounts"),
    (5, "Administrative Personnel"),
    (6, "Domestic Security"),
    (7, "Agriculture"),
    (8, "Aliens and Nationality"),
    (9, "Animals and Animal Products"),
    (10, "Energy"),
    (11, "Federal Elections"),
    (12, "Banks and Banking"),
    (13, "Business Credit and Assistance"),
    (14, "Aeronautics and Space"),
    (15, "Commerce and Foreign Trade"),
    (16, "Commercial Practices"),
    (17, "Commodity and Securities Exchanges"),
    (18, "Conservation of Power and Water Resources"),
    (19, "Customs Duties"),
    (20, "Employees' Benefits"),
    (21, "Food and Drugs"),
    (22, "Foreign Relations"),
    (23, "Highways"),
    (24, "Housing and Urban Development"),
    (25, "Indians"),
    (26, "Internal Revenue"),
    (27, "Alcohol, Tobacco Products and Firearms"),
    (28, "Judicial Administration"),
    (29, "Labor"),
    (30, "Mineral Resources"),
    (31, "Money and Finance: Treasury"),
    (32, "National Defense"),
    (33, "Navigation and Navigable Waters"),
    (34, "Education"),
    (35, "Panama Canal"),
    (36, "Parks, Forests, and Public Property"),
    (37, "Patents, Trademarks, and Copyrights"),
    (38, "Pensions, Bonuses, and Veterans' Relief"),
    (39, "Postal Service"),
    (40, "Protection of Environment"),
    (41, "Public Contracts and Property Management"),
    (42, "Public Health"),
    (43, "Public Lands: Interior"),
    (44, "Emergency Management and Assistance"),
    (45, "Public Welfare"),
    (46, "Shipping"),
    (47, "Telecommunication"),
    (48, "Federal Acquisition Regulations System"),
    (49, "Transportation"),
    (50, "Wildlife and Fisheries"),
];

/// Look up the known name for a title number.
pub fn title_name(number: u32) -> Option<&'static str> {
    TITLE_NAMES
        .iter()
        .find(|(n, _)| *n == number)
        .map(|(_, name)| *name)
}

/// All valid title numbers, ascending.
pub fn all_title_numbers() -> Vec<u32> {
    TITLE_NAMES.iter().map(|(n, _)| *n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_title() {
        assert_eq!(title_name(7), Some("Agriculture"));
        assert_eq!(title_name(50), Some("Wildlife and Fisheries"));
    }

    #[test]
    fn lookup_unknown_title() {
        assert_eq!(title_name(0), None);
        assert_eq!(title_name(51), None);
    }

    #[test]
    fn all_numbers_ascending_and_complete() {
        let nums = all_title_numbers();
        assert_eq!(nums.len(), 50);
        assert_eq!(nums.first(), Some(&1));
        assert_eq!(nums.last(), Some(&50));
        assert!(nums.windows(2).all(|w| w[0] < w[1]));
    }
}
