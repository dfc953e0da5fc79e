// Prompt construction and response parsing for the need-ranking call.
//
// The prompt includes pre-computed roster counts and ratings so the model
// focuses on positional trade-offs rather than arithmetic, and the response
// contract is a single player id so parsing stays trivial.

use crate::catalog::PlayerAttributes;
use crate::draft::autopick::RosterNeeds;
use crate::draft::state::TeamDraftRecord;

/// Static system prompt for all ranking calls.
pub fn system_prompt() -> String {
    "You are a fantasy-sports draft advisor selecting the best pick for a \
     computer-controlled team.\n\
     \n\
     You will receive the team's current roster composition and a ranked \
     list of available candidates with positions and ratings.\n\
     Weigh positional needs against raw rating: an unfilled position is \
     worth more than a small rating edge at an already-stacked one.\n\
     \n\
     Respond with exactly one player_id copied verbatim from the CANDIDATES \
     list, and nothing else. No explanation, no punctuation."
        .to_string()
}

/// Build the user prompt for one ranking decision.
pub fn build_ranking_prompt(
    team: &TeamDraftRecord,
    candidates: &[PlayerAttributes],
    needs: &RosterNeeds,
    pick_number: u32,
    round: u32,
) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str(&format!(
        "## PICK\nTeam: {} | Pick: {} | Round: {}\n\n",
        team.team_id, pick_number, round
    ));

    prompt.push_str("## ROSTER SO FAR\n");
    if team.picks.is_empty() {
        prompt.push_str("(empty)\n");
    } else {
        let mut positions: Vec<(&str, usize)> = needs.positions().collect();
        positions.sort();
        for (position, count) in positions {
            prompt.push_str(&format!("{position}: {count}\n"));
        }
    }
    prompt.push('\n');

    prompt.push_str("## CANDIDATES\n");
    for candidate in candidates {
        prompt.push_str(&format!(
            "{} | {} | {} | rating {}\n",
            candidate.player_id, candidate.name, candidate.position, candidate.rating
        ));
    }
    prompt.push('\n');

    prompt.push_str("Respond with exactly one player_id from CANDIDATES.");
    prompt
}

/// Extract the chosen player id from a model response.
///
/// Tolerates surrounding whitespace, quoting, and trailing prose by
/// scanning whitespace-separated tokens for the first exact candidate
/// match. Returns `None` if no token matches a candidate.
pub fn parse_choice(response: &str, candidates: &[PlayerAttributes]) -> Option<String> {
    for token in response.split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_alphanumeric() && c != '_' && c != '-');
        if candidates.iter().any(|c| c.player_id == token) {
            return Some(token.to_string());
        }
    }
    None
}
