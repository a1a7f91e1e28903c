//! The fixed CDS usage category taxonomy.
//!
//! Categories are static reference data: 23 members organized into 5 groups.
//! They are never created or destroyed at runtime; adding a category is a
//! change to this enumeration and to the classification rule tables, never to
//! dispatch logic.

/// Error returned when a category code does not name a known category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategoryError {
    /// The code that was not recognized.
    pub code: String,
}

impl std::fmt::Display for UnknownCategoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown CDS category code: '{}'", self.code)
    }
}

impl std::error::Error for UnknownCategoryError {}

/// One of the five groups the CDS taxonomy is organized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum CategoryGroup {
    /// Assessment and diagnosis support.
    AssessmentDiagnosis,
    /// Medication safety and care quality.
    SafetyQuality,
    /// Population health and prevention.
    PopulationHealth,
    /// Patient engagement and self-management.
    PatientEngagement,
    /// Clinical workflow support.
    WorkflowSupport,
}

impl CategoryGroup {
    /// All groups in deterministic order.
    pub const ALL: [CategoryGroup; 5] = [
        CategoryGroup::AssessmentDiagnosis,
        CategoryGroup::SafetyQuality,
        CategoryGroup::PopulationHealth,
        CategoryGroup::PatientEngagement,
        CategoryGroup::WorkflowSupport,
    ];

    /// Returns the snake_case code for this group.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::AssessmentDiagnosis => "assessment_diagnosis",
            Self::SafetyQuality => "safety_quality",
            Self::PopulationHealth => "population_health",
            Self::PatientEngagement => "patient_engagement",
            Self::WorkflowSupport => "workflow_support",
        }
    }
}

/// One label in the fixed CDS usage taxonomy.
///
/// The taxonomy is closed: 23 members across the 5 [`CategoryGroup`]s.
/// `ALL` provides a deterministic iteration order for code that must not
/// depend on hash ordering.
///
/// # Examples
///
/// ```
/// use cds_types::{CdsCategory, CategoryGroup};
///
/// let category = CdsCategory::from_code("drug_interaction").unwrap();
/// assert_eq!(category, CdsCategory::DrugInteraction);
/// assert_eq!(category.group(), CategoryGroup::SafetyQuality);
/// assert_eq!(category.as_code(), "drug_interaction");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum CdsCategory {
    // Assessment / diagnosis
    /// Ordering or interpreting a diagnostic test.
    DiagnosticTest,
    /// Considering alternative diagnoses.
    DifferentialDiagnosis,
    /// Estimating patient risk for a condition or outcome.
    RiskAssessment,
    /// Screening an asymptomatic population for disease.
    Screening,
    /// Grading disease severity or stage.
    SeverityStaging,

    // Safety / quality
    /// Interaction between two or more medications.
    DrugInteraction,
    /// Allergy or other contraindication to a therapy.
    AllergyContraindication,
    /// Dose selection, adjustment, or limits.
    DoseGuidance,
    /// Detection of duplicated therapy.
    DuplicateTherapy,
    /// Monitoring for adverse events during therapy.
    AdverseEventMonitoring,

    // Population health
    /// Immunization schedules and catch-up recommendations.
    Immunization,
    /// Preventive care measures.
    PreventiveCare,
    /// Longitudinal management of chronic disease.
    ChronicDiseaseManagement,
    /// Identification of gaps in recommended care.
    CareGapIdentification,

    // Patient engagement
    /// Educating the patient about their condition or therapy.
    PatientEducation,
    /// Shared decision-making between clinician and patient.
    SharedDecisionMaking,
    /// Supporting patient self-management.
    SelfManagementSupport,
    /// Supporting adherence to prescribed therapy.
    AdherenceSupport,

    // Workflow support
    /// Recommending or initiating a treatment.
    TreatmentRecommendation,
    /// Referral to a specialist or service.
    ReferralGuidance,
    /// Selection of a predefined order set.
    OrderSetSelection,
    /// Scheduling follow-up encounters or repeat testing.
    FollowUpScheduling,
    /// Prompting for required documentation.
    DocumentationPrompt,
}

impl CdsCategory {
    /// All categories in deterministic order (grouped, then declaration order).
    pub const ALL: [CdsCategory; 23] = [
        Self::DiagnosticTest,
        Self::DifferentialDiagnosis,
        Self::RiskAssessment,
        Self::Screening,
        Self::SeverityStaging,
        Self::DrugInteraction,
        Self::AllergyContraindication,
        Self::DoseGuidance,
        Self::DuplicateTherapy,
        Self::AdverseEventMonitoring,
        Self::Immunization,
        Self::PreventiveCare,
        Self::ChronicDiseaseManagement,
        Self::CareGapIdentification,
        Self::PatientEducation,
        Self::SharedDecisionMaking,
        Self::SelfManagementSupport,
        Self::AdherenceSupport,
        Self::TreatmentRecommendation,
        Self::ReferralGuidance,
        Self::OrderSetSelection,
        Self::FollowUpScheduling,
        Self::DocumentationPrompt,
    ];

    /// Returns the group this category belongs to.
    pub fn group(self) -> CategoryGroup {
        match self {
            Self::DiagnosticTest
            | Self::DifferentialDiagnosis
            | Self::RiskAssessment
            | Self::Screening
            | Self::SeverityStaging => CategoryGroup::AssessmentDiagnosis,
            Self::DrugInteraction
            | Self::AllergyContraindication
            | Self::DoseGuidance
            | Self::DuplicateTherapy
            | Self::AdverseEventMonitoring => CategoryGroup::SafetyQuality,
            Self::Immunization
            | Self::PreventiveCare
            | Self::ChronicDiseaseManagement
            | Self::CareGapIdentification => CategoryGroup::PopulationHealth,
            Self::PatientEducation
            | Self::SharedDecisionMaking
            | Self::SelfManagementSupport
            | Self::AdherenceSupport => CategoryGroup::PatientEngagement,
            Self::TreatmentRecommendation
            | Self::ReferralGuidance
            | Self::OrderSetSelection
            | Self::FollowUpScheduling
            | Self::DocumentationPrompt => CategoryGroup::WorkflowSupport,
        }
    }

    /// Returns the snake_case code for this category.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::DiagnosticTest => "diagnostic_test",
            Self::DifferentialDiagnosis => "differential_diagnosis",
            Self::RiskAssessment => "risk_assessment",
            Self::Screening => "screening",
            Self::SeverityStaging => "severity_staging",
            Self::DrugInteraction => "drug_interaction",
            Self::AllergyContraindication => "allergy_contraindication",
            Self::DoseGuidance => "dose_guidance",
            Self::DuplicateTherapy => "duplicate_therapy",
            Self::AdverseEventMonitoring => "adverse_event_monitoring",
            Self::Immunization => "immunization",
            Self::PreventiveCare => "preventive_care",
            Self::ChronicDiseaseManagement => "chronic_disease_management",
            Self::CareGapIdentification => "care_gap_identification",
            Self::PatientEducation => "patient_education",
            Self::SharedDecisionMaking => "shared_decision_making",
            Self::SelfManagementSupport => "self_management_support",
            Self::AdherenceSupport => "adherence_support",
            Self::TreatmentRecommendation => "treatment_recommendation",
            Self::ReferralGuidance => "referral_guidance",
            Self::OrderSetSelection => "order_set_selection",
            Self::FollowUpScheduling => "follow_up_scheduling",
            Self::DocumentationPrompt => "documentation_prompt",
        }
    }

    /// Creates a category from its snake_case code.
    ///
    /// Returns an error if the code does not name a known category; free-form
    /// category strings are never accepted into the model.
    pub fn from_code(code: &str) -> Result<Self, UnknownCategoryError> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_code() == code)
            .ok_or_else(|| UnknownCategoryError {
                code: code.to_string(),
            })
    }
}

impl std::fmt::Display for CdsCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}
