//! Static catalog of supported intents

use super::IntentName;

/// Everything the bot knows about one intent
#[derive(Debug)]
pub struct IntentDef {
    pub name: IntentName,
    /// Shown to users in the welcome and fallback lists
    pub user_suggestion: Option<&'static str>,
    /// One-line description given to the classifier
    pub prompt_instructions: &'static str,
    /// Short phrase describing the request, used when talking about it
    pub text: &'static str,
    /// Slot names the classifier may extract
    pub slots: &'static [&'static str],
    /// Slots whose change means the user started a new request
    pub critical_slots: &'static [&'static str],
    /// Slots that must be present before the request can be answered
    pub required_slots: &'static [&'static str],
    pub examples: &'static [&'static str],
    pub is_fallback: bool,
}

static GET_SINGLE_DRUG_PRICE: IntentDef = IntentDef {
    name: IntentName::GetSingleDrugPrice,
    user_suggestion: Some("Get price of a drug"),
    prompt_instructions: "User is asking for the cost of a single drug/medication",
    text: "get drug prices",
    slots: &[
        "drug_name",
        "drug_form",
        "dosage",
        "frequency",
        "duration",
        "rate",
        "strength",
        "route",
    ],
    critical_slots: &["drug_name"],
    required_slots: &["drug_name", "dosage", "frequency"],
    examples: &[
        "What is the [duration] cost for [dosage]mg of [drug_name]?",
        "How much does [dosage] of [drug_name] cost for [duration]?",
        "Is [drug_name] covered under my plan?",
        "What is my copay for [drug_name]?",
        "How much will I pay for [drug_name] at [pharmacy]?",
    ],
    is_fallback: false,
};

static GET_MULTI_DRUG_PRICE: IntentDef = IntentDef {
    name: IntentName::GetMultiDrugPrice,
    user_suggestion: None,
    prompt_instructions: "User is asking for the cost of multiple drugs/medications",
    text: "get drug prices of multiple drugs",
    slots: &["drug_names"],
    critical_slots: &["drug_names"],
    required_slots: &[],
    examples: &["What is the cost of [drug_name], [drug_name], and [drug_name]?"],
    is_fallback: false,
};

static FIND_PROVIDER: IntentDef = IntentDef {
    name: IntentName::FindProvider,
    user_suggestion: Some("Find a doctor, provider, or facility"),
    prompt_instructions: "User is asking for a provider, doctor, or facility",
    text: "find a provider",
    slots: &["provider_type", "location", "insurance_plan", "preferred_provider"],
    critical_slots: &["provider_type", "location"],
    required_slots: &[],
    examples: &[
        "Find a [provider_type] near [location]",
        "Are there any [provider_type] in my network?",
        "Who is my primary care physician?",
        "I need a [specialty] doctor in [location]",
        "Can you help me locate a hospital close to [location]?",
    ],
    is_fallback: false,
};

static GET_PLAN_INFO: IntentDef = IntentDef {
    name: IntentName::GetPlanInfo,
    user_suggestion: Some("Learn about plan benefits, coverage details, or eligibility"),
    prompt_instructions: "User is asking for information about their plan",
    text: "get plan information",
    slots: &[
        "plan_type",
        "benefit_type",
        "coverage_area",
        "effective_date",
        "network_status",
    ],
    critical_slots: &["plan_type", "benefit_type"],
    required_slots: &[],
    examples: &[
        "What does my [plan_type] cover?",
        "Explain my [benefit_type] benefits",
        "Is [service] covered under my plan?",
        "What is my deductible for [plan_type]?",
        "Does my plan require referrals for specialists?",
    ],
    is_fallback: false,
};

static WELCOME: IntentDef = IntentDef {
    name: IntentName::Welcome,
    user_suggestion: None,
    prompt_instructions:
        "User says hello or other greeting, asks for help, or asks who they are talking to",
    text: "find out what I can do",
    slots: &[],
    critical_slots: &[],
    required_slots: &[],
    examples: &["Hello", "Hi there", "Good morning", "I need help", "Can you assist me?"],
    is_fallback: false,
};

static UNKNOWN: IntentDef = IntentDef {
    name: IntentName::Unknown,
    user_suggestion: None,
    prompt_instructions: "Intent does not match any supported category or is unclear/unsupported",
    text: "unclear",
    slots: &[],
    critical_slots: &[],
    required_slots: &[],
    examples: &[
        "I want to talk about something else",
        "Blah blah",
        "Random text",
        "???",
        "What is the weather today?",
    ],
    is_fallback: true,
};

static CATALOG: [&IntentDef; 6] = [
    &GET_SINGLE_DRUG_PRICE,
    &GET_MULTI_DRUG_PRICE,
    &FIND_PROVIDER,
    &GET_PLAN_INFO,
    &WELCOME,
    &UNKNOWN,
];

/// All intents, in the order they are presented to the classifier
#[cfg(test)]
pub fn catalog() -> &'static [&'static IntentDef] {
    &CATALOG
}

impl IntentDef {
    pub fn get(name: IntentName) -> &'static IntentDef {
        match name {
            IntentName::GetSingleDrugPrice => &GET_SINGLE_DRUG_PRICE,
            IntentName::GetMultiDrugPrice => &GET_MULTI_DRUG_PRICE,
            IntentName::FindProvider => &FIND_PROVIDER,
            IntentName::GetPlanInfo => &GET_PLAN_INFO,
            IntentName::Welcome => &WELCOME,
            IntentName::Unknown => &UNKNOWN,
        }
    }

    pub fn is_critical(&self, slot: &str) -> bool {
        self.critical_slots.contains(&slot)
    }
}

/// User-facing suggestions of intents that have one
pub fn suggestions() -> Vec<&'static str> {
    CATALOG.iter().filter_map(|def| def.user_suggestion).collect()
}

/// One `"Name: instructions (slot, slot)"` line per intent
pub fn prompt_instructions(include_slots: bool) -> Vec<String> {
    CATALOG
        .iter()
        .map(|def| {
            if include_slots && !def.slots.is_empty() {
                format!(
                    "{}: {} ({})",
                    def.name,
                    def.prompt_instructions,
                    def.slots.join(", ")
                )
            } else {
                format!("{}: {}", def.name, def.prompt_instructions)
            }
        })
        .collect()
}
