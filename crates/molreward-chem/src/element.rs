//! Element table for the atoms molreward understands.

/// Static element data.
#[derive(Debug, PartialEq)]
pub struct Element {
    pub atomic_number: u8,
    pub symbol: &'static str,
    /// Standard atomic weight (IUPAC, conventional values)
    pub atomic_weight: f64,
    /// Allowed neutral valences, ascending
    pub valences: &'static [u8],
}

pub const HYDROGEN_WEIGHT: f64 = 1.008;

static ELEMENTS: &[Element] = &[
    Element { atomic_number: 1,  symbol: "H",  atomic_weight: 1.008,   valences: &[1] },
    Element { atomic_number: 3,  symbol: "Li", atomic_weight: 6.94,    valences: &[1] },
    Element { atomic_number: 5,  symbol: "B",  atomic_weight: 10.81,   valences: &[3] },
    Element { atomic_number: 6,  symbol: "C",  atomic_weight: 12.011,  valences: &[4] },
    Element { atomic_number: 7,  symbol: "N",  atomic_weight: 14.007,  valences: &[3, 5] },
    Element { atomic_number: 8,  symbol: "O",  atomic_weight: 15.999,  valences: &[2] },
    Element { atomic_number: 9,  symbol: "F",  atomic_weight: 18.998,  valences: &[1] },
    Element { atomic_number: 11, symbol: "Na", atomic_weight: 22.990,  valences: &[1] },
    Element { atomic_number: 12, symbol: "Mg", atomic_weight: 24.305,  valences: &[2] },
    Element { atomic_number: 14, symbol: "Si", atomic_weight: 28.085,  valences: &[4] },
    Element { atomic_number: 15, symbol: "P",  atomic_weight: 30.974,  valences: &[3, 5] },
    Element { atomic_number: 16, symbol: "S",  atomic_weight: 32.06,   valences: &[2, 4, 6] },
    Element { atomic_number: 17, symbol: "Cl", atomic_weight: 35.45,   valences: &[1] },
    Element { atomic_number: 19, symbol: "K",  atomic_weight: 39.098,  valences: &[1] },
    Element { atomic_number: 20, symbol: "Ca", atomic_weight: 40.078,  valences: &[2] },
    Element { atomic_number: 34, symbol: "Se", atomic_weight: 78.971,  valences: &[2, 4, 6] },
    Element { atomic_number: 35, symbol: "Br", atomic_weight: 79.904,  valences: &[1] },
    Element { atomic_number: 53, symbol: "I",  atomic_weight: 126.904, valences: &[1] },
];

/// Look up an element by its (case-sensitive) symbol.
pub fn by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

impl Element {
    pub fn is_carbon(&self) -> bool {
        self.atomic_number == 6
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atomic_number == 1
    }

    /// Any atom other than carbon and hydrogen.
    pub fn is_heteroatom(&self) -> bool {
        !self.is_carbon() && !self.is_hydrogen()
    }

    pub fn max_valence(&self) -> u8 {
        self.valences.last().copied().unwrap_or(0)
    }
}
