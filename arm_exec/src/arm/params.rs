//! Parameters structure for the Arm

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{ArmError, Joint, NUM_JOINTS};
use serde::{Serialize, Deserialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the Arm. All arrays are indexed by [`Joint::index`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ArmParams {
    // ---- CAPABILITIES ----
    /// Maximum joint rotation rate
    ///
    /// Units: degrees/second
    pub max_rate_degs: [f64; NUM_JOINTS],

    /// Minimum joint absolute position (lowest negative value)
    ///
    /// Units: degrees
    pub min_pos_deg: [f64; NUM_JOINTS],

    /// Maximum joint absolute position (highest positive value)
    ///
    /// Units: degrees
    pub max_pos_deg: [f64; NUM_JOINTS],

    // ---- CONTROL ----
    /// Distance from the target at which a joint is considered converged.
    ///
    /// Units: degrees
    pub tolerance_deg: [f64; NUM_JOINTS],

    /// Position of the joints at power on.
    ///
    /// Units: degrees
    pub start_pos_deg: [f64; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmParams {
    /// Check the parameters are self consistent.
    pub fn validate(&self) -> Result<(), ArmError> {
        for joint in Joint::ALL.iter() {
            let i = joint.index();

            if !(self.max_rate_degs[i].is_finite() && self.max_rate_degs[i] > 0.0) {
                return Err(ArmError::InvalidParams(format!(
                    "{} max rate must be positive, found {}",
                    joint, self.max_rate_degs[i]
                )));
            }
            if !(self.min_pos_deg[i] <= self.max_pos_deg[i]) {
                return Err(ArmError::InvalidParams(format!(
                    "{} position limits are inverted ({} > {})",
                    joint, self.min_pos_deg[i], self.max_pos_deg[i]
                )));
            }
            if !(self.tolerance_deg[i] >= 0.0) {
                return Err(ArmError::InvalidParams(format!(
                    "{} tolerance must not be negative, found {}",
                    joint, self.tolerance_deg[i]
                )));
            }
            if self.start_pos_deg[i] < self.min_pos_deg[i]
                || self.start_pos_deg[i] > self.max_pos_deg[i]
            {
                return Err(ArmError::InvalidParams(format!(
                    "{} start position {} is outside the limits",
                    joint, self.start_pos_deg[i]
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params() -> ArmParams {
        ArmParams {
            max_rate_degs: [90.0, 120.0, 90.0],
            min_pos_deg: [-30.0, -160.0, -180.0],
            max_pos_deg: [110.0, 10.0, 180.0],
            tolerance_deg: [1.0, 1.0, 1.0],
            start_pos_deg: [0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_validate() {
        assert!(params().validate().is_ok());

        let mut p = params();
        p.max_rate_degs[1] = 0.0;
        assert!(matches!(p.validate(), Err(ArmError::InvalidParams(_))));

        let mut p = params();
        p.min_pos_deg[0] = 200.0;
        assert!(matches!(p.validate(), Err(ArmError::InvalidParams(_))));

        let mut p = params();
        p.start_pos_deg[2] = 200.0;
        assert!(matches!(p.validate(), Err(ArmError::InvalidParams(_))));
    }

    #[test]
    fn test_from_toml() {
        let p: ArmParams = util::params::from_str(
            r#"
            max_rate_degs = [90.0, 120.0, 90.0]
            min_pos_deg = [-30.0, -160.0, -180.0]
            max_pos_deg = [110.0, 10.0, 180.0]
            tolerance_deg = [1.0, 1.0, 1.0]
            start_pos_deg = [0.0, -10.0, 0.0]
            "#,
        )
        .unwrap();

        assert_eq!(p.start_pos_deg[Joint::Elbow.index()], -10.0);
        assert!(p.validate().is_ok());
    }
}
