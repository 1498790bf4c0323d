//! Observation records surfaced to callers.
//!
//! Every record carries the time it was taken and the start time of the
//! treatment it may reflect. Construction rejects a record that claims to
//! observe a treatment before it began.

use serde::Serialize;

use crate::error::CausalityError;
use crate::id::VesselId;

/// A single measured value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObservationRecord {
    vessel: VesselId,
    assay: String,
    observation_time: f64,
    treatment_start_time: Option<f64>,
    value: f64,
    unit: String,
}

impl ObservationRecord {
    /// Build a record, enforcing `observation_time >= treatment_start_time`.
    ///
    /// Equal times are allowed: a read at the instant of dosing is valid.
    ///
    /// ```
    /// use vitro_core::{ObservationRecord, VesselId};
    ///
    /// let ok = ObservationRecord::new(VesselId(0), "viability", 5.0, Some(5.0), 0.9, "fraction");
    /// assert!(ok.is_ok());
    /// let early = ObservationRecord::new(VesselId(0), "viability", 4.0, Some(5.0), 0.9, "fraction");
    /// assert!(early.is_err());
    /// ```
    pub fn new(
        vessel: VesselId,
        assay: impl Into<String>,
        observation_time: f64,
        treatment_start_time: Option<f64>,
        value: f64,
        unit: impl Into<String>,
    ) -> Result<Self, CausalityError> {
        if !observation_time.is_finite() {
            return Err(CausalityError::NonFiniteTime {
                time: observation_time,
            });
        }
        if let Some(start) = treatment_start_time {
            if !start.is_finite() {
                return Err(CausalityError::NonFiniteTime { time: start });
            }
            if observation_time < start {
                return Err(CausalityError::ObservationBeforeTreatment {
                    observation_time,
                    treatment_start_time: start,
                });
            }
        }
        Ok(Self {
            vessel,
            assay: assay.into(),
            observation_time,
            treatment_start_time,
            value,
            unit: unit.into(),
        })
    }

    /// Observed vessel.
    pub fn vessel(&self) -> VesselId {
        self.vessel
    }

    /// Assay name.
    pub fn assay(&self) -> &str {
        &self.assay
    }

    /// When the measurement was taken.
    pub fn observation_time(&self) -> f64 {
        self.observation_time
    }

    /// Start of the causally related treatment, if any.
    pub fn treatment_start_time(&self) -> Option<f64> {
        self.treatment_start_time
    }

    /// Hours since treatment start, if treated.
    pub fn time_since_treatment(&self) -> Option<f64> {
        self.treatment_start_time
            .map(|start| self.observation_time - start)
    }

    /// Measured value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Unit label.
    pub fn unit(&self) -> &str {
        &self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_before_treatment_rejected() {
        let err =
            ObservationRecord::new(VesselId(1), "count", 1.0, Some(2.0), 10.0, "cells").unwrap_err();
        assert_eq!(
            err,
            CausalityError::ObservationBeforeTreatment {
                observation_time: 1.0,
                treatment_start_time: 2.0
            }
        );
    }

    #[test]
    fn equal_times_accepted() {
        let rec =
            ObservationRecord::new(VesselId(1), "count", 2.0, Some(2.0), 10.0, "cells").unwrap();
        assert_eq!(rec.time_since_treatment(), Some(0.0));
    }

    #[test]
    fn untreated_vessel_has_no_start() {
        let rec = ObservationRecord::new(VesselId(1), "count", 0.0, None, 10.0, "cells").unwrap();
        assert_eq!(rec.time_since_treatment(), None);
    }

    #[test]
    fn non_finite_times_rejected() {
        assert!(ObservationRecord::new(VesselId(1), "c", f64::NAN, None, 1.0, "u").is_err());
        assert!(
            ObservationRecord::new(VesselId(1), "c", 1.0, Some(f64::INFINITY), 1.0, "u").is_err()
        );
    }

    #[test]
    fn serializes_to_json() {
        let rec =
            ObservationRecord::new(VesselId(3), "viability", 4.0, Some(1.0), 0.8, "fraction")
                .unwrap();
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"assay\":\"viability\""), "{json}");
    }
}
