//! Model prompt construction.
//!
//! The prompt asks the model for five sections in a fixed order and lists every patient field,
//! supplied or not. A field the caller left out is written as [`NOT_PROVIDED`] so the model never
//! has to guess whether it was omitted on purpose.

use crate::constants::NOT_PROVIDED;
use crate::intake::Intake;
use std::fmt::Display;

fn or_placeholder<T: Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_PROVIDED.to_string())
}

fn with_unit<T: Display>(value: Option<T>, unit: &str) -> String {
    value
        .map(|v| format!("{} {}", v, unit))
        .unwrap_or_else(|| NOT_PROVIDED.to_string())
}

/// Builds the model input for one intake. Pure; performs no validation.
pub fn build_prompt(intake: &Intake) -> String {
    format!(
        "You are a medical AI assistant. Analyze the following patient information and provide:

1. **Potential Diagnosis**: What conditions might cause these symptoms?
2. **Recommended Medications**: Suggest over-the-counter or common medications (with dosages)
3. **Specialist Referral**: Which type of doctor should they see?
4. **Urgency Level**: Rate from 1-10 and indicate if ER visit needed
5. **Home Care Tips**: Self-care recommendations

**Patient Information:**
- Symptoms: {symptoms}
- Age: {age}
- Sex: {sex}
- Weight: {weight}
- Height: {height}
- Duration: {duration}
- Pain/Severity (1-10): {severity}

Please provide clear, actionable medical guidance. If symptoms indicate emergency, clearly state \"EMERGENCY\" at the start of your response.

**IMPORTANT DISCLAIMER**: This is for informational purposes only. Always consult a healthcare professional for medical advice.",
        symptoms = intake.symptoms.as_str(),
        age = or_placeholder(intake.age),
        sex = or_placeholder(intake.sex.as_deref()),
        weight = with_unit(intake.weight, "lbs"),
        height = with_unit(intake.height, "inches"),
        duration = or_placeholder(intake.duration.as_deref()),
        severity = or_placeholder(intake.severity),
    )
}
