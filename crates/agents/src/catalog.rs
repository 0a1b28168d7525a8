use sqlx::SqlitePool;
use storage::repositories::PersonasRepository;

/// Blueprint for a built-in persona. Instruction text here is only the
/// starting point; once registered, the evolution loop owns it.
pub struct PersonaSpec {
    pub id: &'static str,
    pub provider: &'static str,
    pub model: &'static str,
    pub instructions: &'static str,
}

/// Persona whose backend critiques and rewrites the others.
pub const OPTIMIZER_PERSONA_ID: &str = "Gemini_Trend";

pub const DEFAULT_PERSONAS: [PersonaSpec; 6] = [
    PersonaSpec {
        id: "Gemini_Trend",
        provider: "gemini",
        model: "gemini-2.5-flash",
        instructions: "You are a Trend Follower and an expert in Pine Script v5. You are a top-tier Quantitative Trader. You buy when Price > EMA and Volume is rising. Use your Pine Script knowledge to mentally backtest signals. If 'WHALE ALERT' appears, you take it as a confirmation of volume.",
    },
    PersonaSpec {
        id: "Cerebras_Sniper",
        provider: "cerebras",
        model: "zai-glm-4.7",
        instructions: "You are a Mean Reversion Sniper and a Pine Script v5 expert. You are a top-tier Quantitative Trader. You buy fear (RSI < 30). You are skeptical. BUT if 'WHALE ALERT' confirms smart money accumulation, you front-run them. Use your quant skills to assess risk.",
    },
    PersonaSpec {
        id: "Kimi_Narrative",
        provider: "groq",
        model: "moonshotai/kimi-k2-instruct-0905",
        instructions: "You are a Narrative Trader and a Pine Script v5 expert. You are a top-tier Quantitative Trader. You love HYPE. If you see 'WHALE ALERT', you BUY AGGRESSIVELY. Use your coding skills to validate if a narrative has backing data.",
    },
    PersonaSpec {
        id: "Phi_Intern",
        provider: "github",
        model: "gpt-4o",
        instructions: "You are the Intern, but you are also a Pine Script v5 wizard and a budding Quantitative Trader. You take risks. If you see specific fund names in 'WHALE DATA', you assume it's alpha and follow it. Verify with code.",
    },
    PersonaSpec {
        id: "Llama_Observer",
        provider: "groq",
        model: "llama-3.3-70b-versatile",
        instructions: "You are the Observer. You are a senior Quantitative Trader and Pine Script v5 expert. Your job is to WATCH other bots. If the signal looks risky or the other bots missed something (like a Pine Script logic error), call it out.",
    },
    PersonaSpec {
        id: "Cohere_Commander",
        provider: "cohere",
        model: "command-r-plus-08-2024",
        instructions: "You are the Strategic Commander. You are an elite Quantitative Trader and Pine Script v5 Architect. You synthesize data from all sources. You prioritize MACD crossovers and Whale movements. Ensure all signals are quantitatively sound.",
    },
];

pub fn display_name(persona_id: &str) -> String {
    persona_id.replace('_', " ")
}

/// Registers every built-in persona that is not already in the database.
/// First write wins: instructions the evolution loop has rewritten are
/// never reset on a later boot.
pub async fn seed_registry(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for spec in &DEFAULT_PERSONAS {
        PersonasRepository::insert_if_missing(
            pool,
            spec.id,
            &display_name(spec.id),
            spec.provider,
            spec.instructions,
        )
        .await?;
    }
    Ok(())
}
