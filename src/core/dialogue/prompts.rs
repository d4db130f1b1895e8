//! Prompts and the field list for the merchant application interview.

/// Opening line spoken when a session starts.
pub const GREETING: &str = "Hello, can we get started by telling me the first steps?";

/// Reply substituted when the dialogue step fails, times out or returns nothing.
pub const FALLBACK_REPLY: &str = "Sorry, I had trouble processing that. Could you please repeat?";

/// Phrase the model says once the user has confirmed every collected field.
pub const END_SENTINEL: &str = "END OF CONVERSATION";

/// Field names of the Merchant Processing Application form.
pub const FORM_FIELDS: &[&str] = &[
    "SiteCompanyName1",
    "SiteAddress",
    "SiteCity",
    "SiteState",
    "SiteZip",
    "SiteVoice",
    "SiteFax",
    "CorporateCompanyName1",
    "CorporateAddress",
    "CorporateCity",
    "CorporateState",
    "CorporateZip",
    "CorporateName",
    "SiteEmail",
    "CorporateVoice",
    "CorporateFax",
    "BusinessWebsite",
    "CorporateEmail",
    "CustomerSvcEmail",
    "AppRetrievalMail",
    "AppRetrievalFax",
    "AppRetrievalFaxNumber",
    "MCC-Desc",
    "MerchantInitials1",
    "MerchantInitials2",
    "MerchantInitials3",
    "MerchantInitials4",
    "MerchantInitials5",
    "MerchantInitials6",
    "MerchantInitials7",
    "signer1signature1",
    "Owner0Name1",
    "Owner0LastName1",
    "signer1signature2",
    "Owner0Name2",
    "Owner0LastName2",
];

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You extract structured fields from conversations.";

pub const INSTRUCTION_PROMPT: &str = "\
You are an AI assistant designed to help users fill out a Merchant Processing Application and Agreement form. \
Greet the user in a friendly way when starting.
Your task is to guide the user through each section of the form, asking relevant questions to extract the necessary information required.
Ensure that the conversation remains professional and user-friendly, providing explanations or examples when necessary \
to help the user understand the context of each question. DO NOT ANSWER ANY QUESTIONS NOT RELATED TO THE TASK AT HAND.
Always prioritize privacy and remind the user not to share sensitive information unless necessary for the form. \
For sections requiring specific types of data like percentages, business types, or legal requirements, offer examples to aid in understanding. \
Confirm each detail with the user before moving on to the next section. Only ask a couple of questions at a time and not all at once.
Once all these fields are collected, read back the entire collected information to the user and ask them to confirm it \
and mention that it may take a few seconds to process all the information.
After they confirm respond with 'END OF CONVERSATION' and nothing else.";

/// Build the user message for the field-extraction call.
pub fn extraction_prompt(fields: &[&str], last_assistant: &str, user_text: &str) -> String {
    let field_list = fields
        .iter()
        .map(|f| format!("\"{f}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are helping to fill out a merchant processing application form. \
Based on the assistant's question and the user's response, extract only the field values \
using the exact field names from this list:\n\n[{field_list}]\n\n\
Assistant: {last_assistant}\nUser: {user_text}\n\n\
Respond ONLY with a valid JSON object using only the field names above."
    )
}
