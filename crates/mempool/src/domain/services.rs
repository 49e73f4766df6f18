//! Admission-floor checks applied to a transaction before `Mempool::submit`.
//!
//! These run ahead of `submit` (§6 configuration table) so a transaction
//! that fails them never occupies a table slot.

use shared_types::Transaction;

use super::entities::MempoolConfig;
use super::errors::MempoolError;

/// Checks `tx` against the configured gas floors, returning the first
/// violation found.
pub fn check_admission_floor(tx: &Transaction, config: &MempoolConfig) -> Result<(), MempoolError> {
    if tx.gas_price < config.min_gas_price {
        return Err(MempoolError::GasPriceTooLow {
            price: tx.gas_price,
            minimum: config.min_gas_price,
        });
    }

    let floor = if tx.is_deploy() {
        config.deploy_gas_limit
    } else {
        config.min_gas_limit
    };
    if tx.gas_limit < floor {
        return Err(MempoolError::GasLimitTooLow {
            limit: tx.gas_limit,
            minimum: floor,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx(gas_price: u64, gas_limit: u64, deploy: bool) -> Transaction {
        Transaction {
            from: [1u8; 32],
            to: if deploy { None } else { Some([2u8; 32]) },
            value: 0,
            nonce: 0,
            gas_limit,
            gas_price,
            data: Vec::new(),
            signature: [0u8; 64],
        }
    }

    #[test]
    fn rejects_gas_price_below_floor() {
        let config = MempoolConfig {
            min_gas_price: 10,
            ..MempoolConfig::default()
        };
        let err = check_admission_floor(&sample_tx(5, 21_000, false), &config).unwrap_err();
        assert!(matches!(err, MempoolError::GasPriceTooLow { .. }));
    }

    #[test]
    fn rejects_gas_limit_below_floor_for_regular_tx() {
        let config = MempoolConfig {
            min_gas_limit: 21_000,
            min_gas_price: 0,
            ..MempoolConfig::default()
        };
        let err = check_admission_floor(&sample_tx(0, 10_000, false), &config).unwrap_err();
        assert!(matches!(err, MempoolError::GasLimitTooLow { .. }));
    }

    #[test]
    fn deploy_tx_checked_against_deploy_floor() {
        let config = MempoolConfig {
            deploy_gas_limit: 100_000,
            min_gas_price: 0,
            ..MempoolConfig::default()
        };
        assert!(check_admission_floor(&sample_tx(0, 50_000, true), &config).is_err());
        assert!(check_admission_floor(&sample_tx(0, 150_000, true), &config).is_ok());
    }
}
