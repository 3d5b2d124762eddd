use std::fmt;

/// Errors raised while building or querying a response curve
#[derive(Debug, Clone, PartialEq)]
pub enum CurveError {
    /// The curve has no sample points
    Empty,
    /// Two sample points share the same cost value
    DuplicateCost(f64),
    /// A query cost fell below the cheapest observed sample and
    /// out-of-bounds handling is off
    CostBelowDomain { cost: f64, min_cost: f64 },
    /// A query cost is NaN or infinite
    NonFiniteCost(f64),
}

impl fmt::Display for CurveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveError::Empty => write!(f, "response curve has no sample points"),
            CurveError::DuplicateCost(cost) => {
                write!(f, "response curve has duplicate samples at cost {cost}")
            }
            CurveError::CostBelowDomain { cost, min_cost } => {
                write!(
                    f,
                    "cost {cost} is below the cheapest observed sample ({min_cost}) \
                     and out-of-bounds handling is disabled"
                )
            }
            CurveError::NonFiniteCost(cost) => write!(f, "cost {cost} is not finite"),
        }
    }
}

impl std::error::Error for CurveError {}

/// Errors raised while assembling a portfolio dataset
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// No observations were supplied at all
    NoObservations,
    /// A country's curve could not be built
    Curve { country: String, source: CurveError },
    /// A budget map references a country the dataset does not contain
    UnknownCountry(String),
    /// A budget map is missing an entry for a dataset country
    MissingBudget(String),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::NoObservations => write!(f, "no model result observations supplied"),
            DatasetError::Curve { country, source } => {
                write!(f, "invalid response curve for {country}: {source}")
            }
            DatasetError::UnknownCountry(country) => {
                write!(f, "budget refers to unknown country {country}")
            }
            DatasetError::MissingBudget(country) => {
                write!(f, "no budget entry for country {country}")
            }
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Curve { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors raised by the allocation orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum AllocationError {
    /// The run configuration listed no methods
    NoMethodsRequested,
    /// Every requested method failed or produced an invalid allocation
    AllMethodsFailed { attempted: usize },
    /// The fungible budget is NaN, infinite, or negative
    InvalidBudget(f64),
    /// A curve query failed while scoring a candidate allocation
    Curve(CurveError),
    /// The input data could not form a dataset
    Dataset(DatasetError),
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationError::NoMethodsRequested => {
                write!(f, "no allocation methods were requested")
            }
            AllocationError::AllMethodsFailed { attempted } => {
                write!(
                    f,
                    "all {attempted} allocation methods failed to produce a valid allocation"
                )
            }
            AllocationError::InvalidBudget(budget) => {
                write!(f, "fungible budget {budget} is not a non-negative finite number")
            }
            AllocationError::Curve(e) => write!(f, "{e}"),
            AllocationError::Dataset(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AllocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AllocationError::Curve(e) => Some(e),
            AllocationError::Dataset(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CurveError> for AllocationError {
    fn from(e: CurveError) -> Self {
        AllocationError::Curve(e)
    }
}

impl From<DatasetError> for AllocationError {
    fn from(e: DatasetError) -> Self {
        AllocationError::Dataset(e)
    }
}

/// Errors raised while building or querying an emulator
#[derive(Debug, Clone, PartialEq)]
pub enum EmulatorError {
    /// No projection rows were supplied
    NoData,
    /// The requested funding fraction cannot be answered from the stored
    /// scenarios (and clamping is off or inapplicable)
    FractionOutOfRange { requested: f64, min: f64, max: f64 },
    /// A dollar query was made but no cost indicator exists to convert with
    NoCostLookup,
    /// The same indicator is projected over different year ranges in
    /// different scenarios
    MismatchedYears(String),
}

impl fmt::Display for EmulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulatorError::NoData => write!(f, "no projection rows supplied"),
            EmulatorError::FractionOutOfRange {
                requested,
                min,
                max,
            } => {
                write!(
                    f,
                    "funding fraction {requested} is outside the stored scenario \
                     range [{min}, {max}]"
                )
            }
            EmulatorError::NoCostLookup => {
                write!(f, "no cost indicator available to convert dollars to a funding fraction")
            }
            EmulatorError::MismatchedYears(indicator) => {
                write!(f, "indicator {indicator} spans different years across scenarios")
            }
        }
    }
}

impl std::error::Error for EmulatorError {}
