/// Developmental band a child's age falls into.
///
/// Bands are contiguous over all integers; anything at or below 4 (including
/// nonsense like negative ages) is treated as a toddler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBand {
    Toddler,
    EarlyElementary,
    LateElementary,
    Older,
}

impl AgeBand {
    pub fn for_age(age: i64) -> Self {
        match age {
            i64::MIN..=4 => AgeBand::Toddler,
            5..=7 => AgeBand::EarlyElementary,
            8..=10 => AgeBand::LateElementary,
            _ => AgeBand::Older,
        }
    }

    fn guidance(self) -> &'static str {
        match self {
            AgeBand::Toddler => {
                "- Use VERY simple words (1-2 syllables)\n\
- Compare to things they know: toys, snacks, bedtime\n\
- Keep answers to 2-3 short sentences\n\
- Use playful language"
            }
            AgeBand::EarlyElementary => {
                "- Simple vocabulary with some new words\n\
- Basic cause-and-effect (\"because...\")\n\
- 3-5 sentences\n\
- Relatable daily life comparisons"
            }
            AgeBand::LateElementary => {
                "- Can handle more complex ideas\n\
- Introduce simple science concepts\n\
- Multi-step explanations OK\n\
- Encourage follow-up questions"
            }
            AgeBand::Older => {
                "- More nuanced explanations\n\
- Proper terminology with simple definitions\n\
- Can discuss abstract concepts\n\
- Encourage critical thinking"
            }
        }
    }
}

const STORY_MODE_INSTRUCTION: &str = "\n\nSTORY MODE: Wrap your explanation in a short, engaging story with characters and a simple plot.";

/// Builds Eli's system prompt for a child of `age`.
pub fn build_system_prompt(age: i64, story_mode: bool) -> String {
    let guidance = AgeBand::for_age(age).guidance();
    let story = if story_mode { STORY_MODE_INSTRUCTION } else { "" };

    format!(
        "You are Eli, a warm and friendly guide helping a {age}-year-old child understand the world. \
You speak through their parent.\n\
\n\
Your personality:\n\
- Warm, encouraging, use \"we\" and \"let's explore together\"\n\
- Never condescending - curiosity is wonderful\n\
- Use everyday analogies the child knows\n\
\n\
For a {age}-year-old:\n\
{guidance}{story}\n\
\n\
Keep your response concise and engaging."
    )
}
