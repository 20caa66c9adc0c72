// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Typed records of the log events a transaction emits

use crate::{
    common::encode_address,
    error::{ApiError, ApiResult},
    node::{RawTransaction, TransactionEvent},
};
use num_bigint::BigUint;

pub const EVENT_TRANSFER_VALUE_ONLY: &str = "transferValueOnly";
pub const EVENT_SIGNAL_ERROR: &str = "signalError";
pub const EVENT_ESDT_TRANSFER: &str = "ESDTTransfer";
pub const EVENT_ESDT_NFT_TRANSFER: &str = "ESDTNFTTransfer";
pub const EVENT_MULTI_ESDT_NFT_TRANSFER: &str = "MultiESDTNFTTransfer";
pub const EVENT_ESDT_LOCAL_BURN: &str = "ESDTLocalBurn";
pub const EVENT_ESDT_NFT_BURN: &str = "ESDTNFTBurn";
pub const EVENT_ESDT_LOCAL_MINT: &str = "ESDTLocalMint";
pub const EVENT_ESDT_NFT_CREATE: &str = "ESDTNFTCreate";
pub const EVENT_ESDT_NFT_ADD_QUANTITY: &str = "ESDTNFTAddQuantity";
pub const EVENT_ESDT_WIPE: &str = "ESDTWipe";

pub const SENDING_VALUE_TO_NON_PAYABLE_CONTRACT: &str = "sending value to non-payable contract";
pub const META_TRANSACTION_IS_INVALID: &str = "meta transaction is invalid";

const NUM_TOPICS_TRANSFER_VALUE_ONLY: usize = 3;
const NUM_TOPICS_PER_TRANSFER: usize = 4;
const NUM_TOPICS_BURN_OR_MINT: usize = 3;
const NUM_TOPICS_WIPE: usize = 4;

/// Native value moved by a contract, without a contract result
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValueTransfer {
    pub sender: String,
    pub receiver: String,
    pub value: BigUint,
}

/// Balance effect of a token operation
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenEvent {
    Transfer {
        identifier: String,
        sender: String,
        receiver: String,
        value: BigUint,
    },
    Burn {
        identifier: String,
        account: String,
        value: BigUint,
    },
    Mint {
        identifier: String,
        account: String,
        value: BigUint,
    },
    Wipe {
        identifier: String,
        account: String,
        value: BigUint,
    },
}

impl TokenEvent {
    pub fn identifier(&self) -> &str {
        match self {
            TokenEvent::Transfer { identifier, .. }
            | TokenEvent::Burn { identifier, .. }
            | TokenEvent::Mint { identifier, .. }
            | TokenEvent::Wipe { identifier, .. } => identifier,
        }
    }
}

pub fn extract_value_transfers(tx: &RawTransaction) -> ApiResult<Vec<ValueTransfer>> {
    tx.events()
        .iter()
        .filter(|event| event.identifier == EVENT_TRANSFER_VALUE_ONLY)
        .map(|event| {
            check_num_topics(event, NUM_TOPICS_TRANSFER_VALUE_ONLY)?;
            Ok(ValueTransfer {
                sender: topic_to_address(event, 0)?,
                receiver: topic_to_address(event, 1)?,
                value: BigUint::from_bytes_be(&event.topics[2]),
            })
        })
        .collect()
}

/// Token transfers, burns, mints and wipes, in emission order
pub fn extract_token_events(tx: &RawTransaction) -> ApiResult<Vec<TokenEvent>> {
    let mut token_events = vec![];
    for event in tx.events() {
        match event.identifier.as_str() {
            EVENT_ESDT_TRANSFER | EVENT_ESDT_NFT_TRANSFER | EVENT_MULTI_ESDT_NFT_TRANSFER => {
                check_num_topics(event, NUM_TOPICS_PER_TRANSFER)?;
                token_events.push(TokenEvent::Transfer {
                    identifier: extended_identifier(&event.topics[0], &event.topics[1]),
                    sender: event.address.clone(),
                    receiver: topic_to_address(event, 3)?,
                    value: BigUint::from_bytes_be(&event.topics[2]),
                });
            },
            EVENT_ESDT_LOCAL_BURN | EVENT_ESDT_NFT_BURN => {
                check_num_topics(event, NUM_TOPICS_BURN_OR_MINT)?;
                token_events.push(TokenEvent::Burn {
                    identifier: extended_identifier(&event.topics[0], &event.topics[1]),
                    account: event.address.clone(),
                    value: BigUint::from_bytes_be(&event.topics[2]),
                });
            },
            EVENT_ESDT_LOCAL_MINT | EVENT_ESDT_NFT_CREATE | EVENT_ESDT_NFT_ADD_QUANTITY => {
                check_num_topics(event, NUM_TOPICS_BURN_OR_MINT)?;
                token_events.push(TokenEvent::Mint {
                    identifier: extended_identifier(&event.topics[0], &event.topics[1]),
                    account: event.address.clone(),
                    value: BigUint::from_bytes_be(&event.topics[2]),
                });
            },
            EVENT_ESDT_WIPE => {
                check_num_topics(event, NUM_TOPICS_WIPE)?;
                token_events.push(TokenEvent::Wipe {
                    identifier: extended_identifier(&event.topics[0], &event.topics[1]),
                    account: topic_to_address(event, 3)?,
                    value: BigUint::from_bytes_be(&event.topics[2]),
                });
            },
            _ => {},
        }
    }
    Ok(token_events)
}

pub fn has_signal_error(tx: &RawTransaction) -> bool {
    tx.events()
        .iter()
        .any(|event| event.identifier == EVENT_SIGNAL_ERROR)
}

/// A `signalError` event whose data starts with `message`
pub fn has_signal_error_with_message(tx: &RawTransaction, message: &str) -> bool {
    tx.events().iter().any(|event| {
        event.identifier == EVENT_SIGNAL_ERROR
            && (event.data.starts_with(message.as_bytes())
                || event
                    .topics
                    .last()
                    .map(|topic| topic.starts_with(message.as_bytes()))
                    .unwrap_or(false))
    })
}

/// Non fungible tokens are identified by `TICKER-random-nonce`, the nonce in hex.
/// Fungible tokens leave the nonce topic empty.
fn extended_identifier(identifier: &[u8], nonce: &[u8]) -> String {
    let identifier = String::from_utf8_lossy(identifier);
    if nonce.is_empty() {
        identifier.to_string()
    } else {
        format!("{}-{}", identifier, hex::encode(nonce))
    }
}

fn check_num_topics(event: &TransactionEvent, expected: usize) -> ApiResult<()> {
    if event.topics.len() == expected {
        Ok(())
    } else {
        Err(bad_num_topics(event))
    }
}

fn bad_num_topics(event: &TransactionEvent) -> ApiError {
    ApiError::CannotRecognizeEvent(Some(format!(
        "bad number of topics for '{}' = {}",
        event.identifier,
        event.topics.len()
    )))
}

fn topic_to_address(event: &TransactionEvent, index: usize) -> ApiResult<String> {
    encode_address(&event.topics[index]).map_err(|err| {
        ApiError::CannotRecognizeEvent(Some(format!(
            "bad address in topic {} of '{}': {}",
            index, event.identifier, err
        )))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::node::TransactionLogs;
    use claims::{assert_matches, assert_ok};

    const ALICE: &str = "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th";
    const BOB: &str = "erd1spyavw0956vq68xj8y4tenjpq2wd5a9p2c6j8gsz7ztyrnpxrruqzu66jx";

    fn pubkey(address: &str) -> Vec<u8> {
        crate::common::decode_address(address).unwrap()
    }

    fn tx_with_event(identifier: &str, topics: Vec<Vec<u8>>) -> RawTransaction {
        RawTransaction {
            hash: "aaaa".to_string(),
            logs: Some(TransactionLogs {
                address: ALICE.to_string(),
                events: vec![TransactionEvent {
                    address: ALICE.to_string(),
                    identifier: identifier.to_string(),
                    topics,
                    data: vec![],
                }],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_transfer_value_only() {
        let tx = tx_with_event(
            EVENT_TRANSFER_VALUE_ONLY,
            vec![pubkey(ALICE), pubkey(BOB), vec![0x01, 0x00]],
        );
        let transfers = extract_value_transfers(&tx).unwrap();
        assert_eq!(
            vec![ValueTransfer {
                sender: ALICE.to_string(),
                receiver: BOB.to_string(),
                value: BigUint::from(256u32),
            }],
            transfers
        );

        let tx = tx_with_event(EVENT_TRANSFER_VALUE_ONLY, vec![pubkey(ALICE), pubkey(BOB)]);
        assert_matches!(
            extract_value_transfers(&tx),
            Err(ApiError::CannotRecognizeEvent(_))
        );
    }

    #[test]
    fn test_esdt_transfer() {
        let tx = tx_with_event(
            EVENT_ESDT_TRANSFER,
            vec![b"ROSETTA-3a2edf".to_vec(), vec![], vec![0x64], pubkey(BOB)],
        );
        let events = extract_token_events(&tx).unwrap();
        assert_eq!(
            vec![TokenEvent::Transfer {
                identifier: "ROSETTA-3a2edf".to_string(),
                sender: ALICE.to_string(),
                receiver: BOB.to_string(),
                value: BigUint::from(100u32),
            }],
            events
        );
    }

    #[test]
    fn test_nft_transfer_has_extended_identifier() {
        let tx = tx_with_event(
            EVENT_ESDT_NFT_TRANSFER,
            vec![b"EXAMPLE-453bec".to_vec(), vec![0x0a], vec![0x01], pubkey(BOB)],
        );
        let events = extract_token_events(&tx).unwrap();
        assert_eq!("EXAMPLE-453bec-0a", events[0].identifier());
    }

    #[test]
    fn test_multi_transfer() {
        // One event per transferred token
        let tx = tx_with_event(
            EVENT_MULTI_ESDT_NFT_TRANSFER,
            vec![b"EXAMPLE-453bec".to_vec(), vec![0x01], vec![0x02], pubkey(BOB)],
        );
        let events = extract_token_events(&tx).unwrap();
        assert_eq!(
            vec![TokenEvent::Transfer {
                identifier: "EXAMPLE-453bec-01".to_string(),
                sender: ALICE.to_string(),
                receiver: BOB.to_string(),
                value: BigUint::from(2u32),
            }],
            events
        );

        let tx = tx_with_event(
            EVENT_MULTI_ESDT_NFT_TRANSFER,
            vec![
                b"ROSETTA-3a2edf".to_vec(),
                vec![],
                vec![0x01],
                b"EXAMPLE-453bec".to_vec(),
                vec![0x01],
                vec![0x02],
                pubkey(BOB),
            ],
        );
        assert_matches!(
            extract_token_events(&tx),
            Err(ApiError::CannotRecognizeEvent(_))
        );
    }

    #[test]
    fn test_nonce_topic_presence_decides_identifier() {
        assert_eq!("ROSETTA-3a2edf", extended_identifier(b"ROSETTA-3a2edf", &[]));
        assert_eq!("EXAMPLE-453bec-00", extended_identifier(b"EXAMPLE-453bec", &[0x00]));
        assert_eq!("EXAMPLE-453bec-0a", extended_identifier(b"EXAMPLE-453bec", &[0x0a]));
    }

    #[test]
    fn test_wrong_topic_counts_are_errors() {
        for (identifier, num_topics) in [
            (EVENT_ESDT_TRANSFER, 3),
            (EVENT_ESDT_NFT_TRANSFER, 5),
            (EVENT_MULTI_ESDT_NFT_TRANSFER, 7),
            (EVENT_ESDT_LOCAL_BURN, 4),
            (EVENT_ESDT_LOCAL_MINT, 2),
            (EVENT_ESDT_NFT_CREATE, 4),
            (EVENT_ESDT_WIPE, 3),
        ] {
            let tx = tx_with_event(identifier, vec![vec![0x01]; num_topics]);
            assert_matches!(
                extract_token_events(&tx),
                Err(ApiError::CannotRecognizeEvent(_))
            );
        }
    }

    #[test]
    fn test_burn_mint_and_wipe() {
        let tx = tx_with_event(EVENT_ESDT_LOCAL_BURN, vec![
            b"ROSETTA-3a2edf".to_vec(),
            vec![],
            vec![0x05],
        ]);
        assert_eq!(
            vec![TokenEvent::Burn {
                identifier: "ROSETTA-3a2edf".to_string(),
                account: ALICE.to_string(),
                value: BigUint::from(5u32),
            }],
            extract_token_events(&tx).unwrap()
        );

        let tx = tx_with_event(EVENT_ESDT_NFT_ADD_QUANTITY, vec![
            b"EXAMPLE-453bec".to_vec(),
            vec![0x01],
            vec![0x05],
        ]);
        let events = extract_token_events(&tx).unwrap();
        assert_matches!(&events[0], TokenEvent::Mint { .. });

        let tx = tx_with_event(EVENT_ESDT_WIPE, vec![
            b"ROSETTA-3a2edf".to_vec(),
            vec![],
            vec![0x05],
            pubkey(BOB),
        ]);
        assert_eq!(
            vec![TokenEvent::Wipe {
                identifier: "ROSETTA-3a2edf".to_string(),
                account: BOB.to_string(),
                value: BigUint::from(5u32),
            }],
            extract_token_events(&tx).unwrap()
        );
    }

    #[test]
    fn test_unrelated_events_are_ignored() {
        let tx = tx_with_event("writeLog", vec![vec![0x01]]);
        assert_ok!(extract_token_events(&tx));
        assert!(extract_token_events(&tx).unwrap().is_empty());
        assert!(extract_value_transfers(&tx).unwrap().is_empty());
    }

    #[test]
    fn test_signal_error() {
        let mut tx = tx_with_event(EVENT_SIGNAL_ERROR, vec![pubkey(ALICE)]);
        assert!(has_signal_error(&tx));
        assert!(!has_signal_error_with_message(
            &tx,
            SENDING_VALUE_TO_NON_PAYABLE_CONTRACT
        ));

        tx.logs.as_mut().unwrap().events[0].data =
            b"sending value to non-payable contract".to_vec();
        assert!(has_signal_error_with_message(
            &tx,
            SENDING_VALUE_TO_NON_PAYABLE_CONTRACT
        ));
    }
}
