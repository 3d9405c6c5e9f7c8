//! Per-tick fee estimates for an in-range position.

use crate::liquidity::{LiquidityModel, WeekdayLiquidity};
use crate::state::MarketSnapshot;
use crate::volume::{ConstantVolume, VolumeModel};
use range_lp_domain::DomainResult;
use range_lp_domain::metrics::fees::pool_share_fee;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Estimates the fees a position earns over one tick.
pub trait FeeModel {
    /// Fees in USD for a position worth `position_value` during `snapshot`.
    ///
    /// # Errors
    /// Returns an error if the model's inputs are degenerate (e.g. zero TVL).
    fn estimate(
        &mut self,
        position_value: Decimal,
        snapshot: &MarketSnapshot,
    ) -> DomainResult<Decimal>;
}

impl<F: FeeModel + ?Sized> FeeModel for Box<F> {
    fn estimate(
        &mut self,
        position_value: Decimal,
        snapshot: &MarketSnapshot,
    ) -> DomainResult<Decimal> {
        (**self).estimate(position_value, snapshot)
    }
}

/// Selects a fee model from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeModelKind {
    /// Position's share of pool TVL times routed volume.
    #[default]
    PoolShare,
    /// Capped share of the tick's trading activity.
    ActivityShare,
}

/// `value / tvl · volume_usd · share · fee_tier`.
#[derive(Debug, Clone)]
pub struct PoolShareFee<L, V> {
    pub fee_tier: Decimal,
    pub liquidity: L,
    pub volume: V,
}

impl<L: LiquidityModel, V: VolumeModel> PoolShareFee<L, V> {
    #[must_use]
    pub fn new(fee_tier: Decimal, liquidity: L, volume: V) -> Self {
        Self {
            fee_tier,
            liquidity,
            volume,
        }
    }
}

impl<L: LiquidityModel, V: VolumeModel> FeeModel for PoolShareFee<L, V> {
    fn estimate(
        &mut self,
        position_value: Decimal,
        snapshot: &MarketSnapshot,
    ) -> DomainResult<Decimal> {
        let tvl = self.liquidity.tvl_usd(snapshot);
        let routed_volume = snapshot.volume_usd() * self.volume.volume_share(snapshot);
        pool_share_fee(position_value, tvl, routed_volume, self.fee_tier)
    }
}

/// `volume_usd · fee_tier · (value / volume_usd) · scalar`, capped at `value · cap_fraction`.
#[derive(Debug, Clone)]
pub struct ActivityShareFee {
    pub fee_tier: Decimal,
    pub scalar: Decimal,
    pub cap_fraction: Decimal,
}

impl ActivityShareFee {
    /// Creates the model with the default 0.1% per-tick cap.
    #[must_use]
    pub fn new(fee_tier: Decimal, scalar: Decimal) -> Self {
        Self {
            fee_tier,
            scalar,
            cap_fraction: Decimal::new(1, 3),
        }
    }
}

impl FeeModel for ActivityShareFee {
    fn estimate(
        &mut self,
        position_value: Decimal,
        snapshot: &MarketSnapshot,
    ) -> DomainResult<Decimal> {
        let volume_usd = snapshot.volume_usd();
        if volume_usd.is_zero() {
            return Ok(Decimal::ZERO);
        }
        // share of activity is value / volume_usd; multiply first to keep it exact
        let estimate = volume_usd * self.fee_tier * position_value / volume_usd * self.scalar;
        Ok(estimate.min(position_value * self.cap_fraction))
    }
}

/// A fee model that never pays; useful for isolating price effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFees;

impl FeeModel for NoFees {
    fn estimate(&mut self, _: Decimal, _: &MarketSnapshot) -> DomainResult<Decimal> {
        Ok(Decimal::ZERO)
    }
}

/// Builds the configured fee model. `seed` fixes the TVL noise.
#[must_use]
pub fn build_fee_model(
    kind: FeeModelKind,
    fee_tier: Decimal,
    fee_estimate_scalar: Decimal,
    pool_tvl_usd: Decimal,
    seed: Option<u64>,
) -> Box<dyn FeeModel + Send> {
    match kind {
        FeeModelKind::PoolShare => {
            let liquidity = match seed {
                Some(seed) => WeekdayLiquidity::seeded(pool_tvl_usd, seed),
                None => WeekdayLiquidity::new(pool_tvl_usd),
            };
            Box::new(PoolShareFee::new(
                fee_tier,
                liquidity,
                ConstantVolume::default(),
            ))
        }
        FeeModelKind::ActivityShare => {
            Box::new(ActivityShareFee::new(fee_tier, fee_estimate_scalar))
        }
    }
}
