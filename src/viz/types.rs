//! Public types and constants for the dashboard views.

/// The dashboard's chart views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewKind {
    /// UK and London house price index against every other region.
    Hpi,
    /// Private rent index, one small panel per region.
    Rents,
    /// Rent and house price growth against inflation, with dated events.
    Inflation,
    /// London borough pay, two years compared per borough.
    Salary,
    /// Borough affordability map with a year selector.
    Map,
}

impl ViewKind {
    pub const ALL: [ViewKind; 5] = [
        ViewKind::Hpi,
        ViewKind::Rents,
        ViewKind::Inflation,
        ViewKind::Salary,
        ViewKind::Map,
    ];

    /// Output file stem, e.g. `hpi` -> `hpi.svg`.
    pub fn slug(self) -> &'static str {
        match self {
            ViewKind::Hpi => "hpi",
            ViewKind::Rents => "rents",
            ViewKind::Inflation => "inflation",
            ViewKind::Salary => "salary",
            ViewKind::Map => "map",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewKind::Hpi => "House price index: UK and London",
            ViewKind::Rents => "Private rents by region",
            ViewKind::Inflation => "Rents, house prices and inflation",
            ViewKind::Salary => "London pay by borough",
            ViewKind::Map => "Housing affordability in London",
        }
    }
}

/// Default container width when none is configured.
pub const DEFAULT_WIDTH: f64 = 880.0;
