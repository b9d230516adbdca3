use anchor_lang::prelude::*;

use crate::constants::PLAYER_SEED;
use crate::errors::GameError;
use crate::state::{PlayerAccount, PlayerView};

#[derive(Accounts)]
#[instruction(owner: Pubkey)]
pub struct GetPlayer<'info> {
    /// CHECK: May not exist yet; owner and contents are checked in the handler.
    #[account(
        seeds = [PLAYER_SEED, owner.as_ref()],
        bump,
    )]
    pub player_data: UncheckedAccount<'info>,
}

/// Read-only lookup, returned to the caller as Anchor return data.
pub fn handler(ctx: Context<GetPlayer>, owner: Pubkey) -> Result<PlayerView> {
    let info = ctx.accounts.player_data.to_account_info();
    require!(
        info.owner == &crate::ID && !info.data_is_empty(),
        GameError::NotFound
    );

    let data = info.try_borrow_data()?;
    let player = PlayerAccount::try_deserialize(&mut &data[..])?;
    require_keys_eq!(player.owner, owner, GameError::NotFound);

    Ok(player.view())
}
