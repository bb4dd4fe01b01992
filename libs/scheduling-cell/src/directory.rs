use async_trait::async_trait;
use uuid::Uuid;

use crate::models::SchedulingError;

#[derive(Debug, Clone)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct PatientProfile {
    pub id: Uuid,
    pub display_name: String,
}

/// Identity resolution, owned by the account system outside this cell.
///
/// The scheduling services only ask "does this doctor/patient exist";
/// `Ok(None)` means absent, an `Err` means the directory itself failed and
/// is treated as a transient error.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>, SchedulingError>;

    async fn find_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Option<PatientProfile>, SchedulingError>;
}
