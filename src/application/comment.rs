//! Markdown bodies for the donation and payout issue comments.

use super::payout::PayoutReceipt;
use crate::domain::currency::Cryptocurrency;
use crate::domain::issue::Issue;
use crate::domain::ports::MarketData;
use rust_decimal::Decimal;
use std::fmt::Write;
use tracing::debug;

pub const DONATION_HEADER: &str = "### Donate to this issue";

/// Renders the comment advertising an issue's donation wallets.
///
/// Balance lines are best effort: a currency whose balance or USD rate cannot
/// be fetched is left out of the balance section and of the total.
pub async fn donation_comment(issue: &Issue, market: &dyn MarketData) -> String {
    let mut body = format!("{DONATION_HEADER}\n");
    for (currency, wallet) in &issue.wallets {
        if wallet.address.is_empty() {
            continue;
        }
        let _ = writeln!(
            body,
            "- {}: [{}]({})",
            currency.ticker(),
            wallet.address,
            currency.address_url(&wallet.address)
        );
    }

    body.push_str("#### Current balance\n");
    let mut total_usd = Decimal::ZERO;
    for (currency, wallet) in &issue.wallets {
        let balance = match market.balance(*currency, &wallet.address).await {
            Ok(balance) => balance,
            Err(e) => {
                debug!(%currency, "omitting balance line: {e}");
                continue;
            }
        };
        let rate = match market.usd_rate(*currency).await {
            Ok(rate) => rate,
            Err(e) => {
                debug!(%currency, "omitting balance line: {e}");
                continue;
            }
        };
        total_usd += balance * rate;
        let _ = writeln!(body, "- {:.8} {}", balance, currency.ticker());
    }
    let _ = writeln!(body, "- Total ${:.2}", total_usd);

    body.push_str(&claim_instructions());
    body
}

fn claim_instructions() -> String {
    let tickers: Vec<String> = Cryptocurrency::ALL.iter().map(|c| c.ticker()).collect();
    let formats: Vec<String> = Cryptocurrency::ALL
        .iter()
        .map(|c| format!("{}{{your_{}_address}}", c.ticker(), c.symbol()))
        .collect();

    let mut section = String::from("\n<details><summary>How to claim a bounty</summary><p>\n\n");
    section.push_str(
        "1. Specify this issue in commit message ([keywords]\
         (https://help.github.com/en/github/managing-your-work-on-github/closing-issues-using-keywords));\n",
    );
    let _ = writeln!(
        section,
        "2. Put to the body of pull request your {} addresses in the format: {};",
        tickers.join(", "),
        formats.join(", ")
    );
    section.push_str(
        "3. When pull request will be accepted, you'll immediately get all \
         cryptocurrency to wallets that you're specified.\n",
    );
    section.push_str("\n</p></details>\n");
    section
}

/// Renders the comment announcing payout transactions, or `None` when the
/// receipt has nothing to show.
pub fn payout_comment(receipt: &PayoutReceipt) -> Option<String> {
    let lines: Vec<String> = receipt
        .iter()
        .filter(|(_, txid)| !txid.is_empty())
        .map(|(currency, txid)| {
            format!("- {}: [{}]({})", currency.ticker(), txid, currency.tx_url(txid))
        })
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(format!("Payout transactions:\n{}\n", lines.join("\n")))
}
