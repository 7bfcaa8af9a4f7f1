// All LLM prompt constants for the Generation module.
// Templates use `{placeholder}` markers replaced by the composer.

/// Used whenever the caller leaves the personal hook empty.
pub const DEFAULT_HOOK: &str =
    "We've been working with companies like yours and noticed some common challenges.";

/// Shared header of every generation prompt.
/// Replace: {audience}, {product}, {tone}, {hook}
pub const BRIEF_TEMPLATE: &str = "You are a world-class cold email copywriter. \
Your emails convert because they feel personal, valuable, and human-written.

Target audience: {audience}
Product/Service: {product}
Write in a {tone} tone that fits this audience.
Personal hook: {hook}";

/// Closing of a single-email prompt.
pub const SINGLE_EMAIL_INSTRUCTION: &str = "Write ONE compelling cold email under 100 words. \
Format with a compelling subject line followed by the email body.";

/// Closing of a multi-variant prompt. Replace: {count}
pub const VARIANTS_INSTRUCTION: &str = "Write {count} distinct email variations. \
Each email should be under 100 words, clear, direct, and conversion-focused.
Format each email with a compelling subject line followed by the email body.";

/// Draft A of the dual flow: attention, interest, desire, action.
pub const PERSUASIVE_PITCH_INSTRUCTION: &str = "Use the PERSUASIVE PITCH approach (AIDA framework):
- Attention: Start with something that grabs their attention
- Interest: Build interest in your solution
- Desire: Create desire for the outcome
- Action: Clear, specific call-to-action

Make it feel like it was written specifically for this person, not a mass email.";

/// Draft B of the dual flow: problem, solution.
pub const PROBLEM_SOLUTION_INSTRUCTION: &str = "Use the PROBLEM-SOLUTION approach:
- Problem: Identify a specific pain point they likely face
- Solution: Present your offer as the direct solution
- Benefit: Highlight the key outcome they'll get
- Action: Simple, low-friction next step

Focus on problems that keep them up at night, then position your solution as the relief.";

pub const AIDA_INSTRUCTION: &str = "Use the AIDA framework for each email:
- Attention: Start with something that grabs their attention
- Interest: Build interest in your solution
- Desire: Create desire for the outcome
- Action: Clear, specific call-to-action

Make each email feel like it was written specifically for this person, not a mass email.";

pub const PAS_INSTRUCTION: &str = "Use the PAS framework for each email:
- Problem: Identify a specific pain point they likely face
- Agitate: Briefly highlight the cost of not solving it
- Solution: Present your offer as the solution

Focus on problems that keep them up at night, then position your solution as the relief.";

pub const FOUR_SENTENCE_INSTRUCTION: &str = "Use the 4-sentence cold email structure for each email:
1. Problem or pain point (that resonates with them)
2. How you help (specific outcome/benefit)
3. Quick credibility boost (social proof, result, or relevant experience)
4. Clear CTA (book a call, reply, visit link, etc.)

Keep each sentence punchy and valuable. No fluff.";

pub const DEFAULT_FRAMEWORK_INSTRUCTION: &str = "Write compelling cold emails that follow \
proven copywriting principles. Focus on value, relevance, and clear next steps.";
