//! Tests for resolver module

#[cfg(test)]
mod tests {
    use super::super::assets::refresh;
    use super::super::strategies::coin_snapshot;
    use super::super::*;
    use crate::client::mock::{
        coin_detail, equity_quote, listing, live_quote, MockCryptoMarket, MockEquityQuotes,
        MockLiveQuotes,
    };
    use crate::types::SourceKind;
    use rust_decimal_macros::dec;

    struct Fixture {
        resolver: SymbolResolver,
        crypto: Arc<MockCryptoMarket>,
        live: Arc<MockLiveQuotes>,
        equity: Arc<MockEquityQuotes>,
    }

    async fn fixture(crypto: MockCryptoMarket, live: MockLiveQuotes, equity: MockEquityQuotes) -> Fixture {
        let crypto = Arc::new(crypto);
        let live = Arc::new(live);
        let equity = Arc::new(equity);
        let assets = AssetTable::load(crypto.as_ref()).await.unwrap().into_shared();

        let resolver = SymbolResolver::from_providers(
            crypto.clone(),
            live.clone(),
            equity.clone(),
            assets,
            &MarketDataConfig::default(),
        );
        Fixture {
            resolver,
            crypto,
            live,
            equity,
        }
    }

    fn bitcoin_market() -> MockCryptoMarket {
        MockCryptoMarket::new().with_coin(
            listing("bitcoin", "btc", "Bitcoin"),
            coin_detail(
                "bitcoin",
                dec!(30000000000),
                dec!(64000),
                Some(dec!(1.5)),
                &[("BTC", "Binance"), ("BTC", "Coinbase Exchange")],
            ),
        )
    }

    fn bare_resolver() -> SymbolResolver {
        SymbolResolver::new(Vec::new(), Vec::new(), dec!(50000), &MarketDataConfig::default().stables)
    }

    #[test]
    fn test_strip_stable_suffix() {
        let resolver = bare_resolver();
        assert_eq!(resolver.strip_stable_suffix("BTCUSDT"), "BTC");
        assert_eq!(resolver.strip_stable_suffix("ethusdc"), "ETH");
        assert_eq!(resolver.strip_stable_suffix("SOLUSD"), "SOL");
        assert_eq!(resolver.strip_stable_suffix("USDT"), "USDT");
        assert_eq!(resolver.strip_stable_suffix("USD"), "USD");
        assert_eq!(resolver.strip_stable_suffix("ETH"), "ETH");
    }

    #[test]
    fn test_majority_from_counts() {
        assert_eq!(Majority::from_counts(0, 0), Majority::Unknown);
        assert_eq!(Majority::from_counts(1, 1), Majority::Unknown);
        assert_eq!(Majority::from_counts(2, 2), Majority::Unknown);
        assert_eq!(Majority::from_counts(2, 1), Majority::Crypto);
        assert_eq!(Majority::from_counts(0, 3), Majority::Equity);
    }

    #[test]
    fn test_clean_exchanges() {
        let cleaned = clean_exchanges(["Binance", "Coinbase Exchange", "binance", "Gate.io", ""]);
        let names: Vec<&str> = cleaned.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["binance", "coinbase", "gate.io"]);
    }

    #[test]
    fn test_coin_snapshot_base_symbol() {
        let detail = coin_detail(
            "wrapped-thing",
            dec!(100),
            dec!(1),
            None,
            &[("0XABCDEF", "Uniswap"), ("VERYLONGNAME", "Uniswap"), ("wthg", "Gate.io")],
        );
        let snapshot = coin_snapshot("WTHING", detail);
        assert_eq!(snapshot.symbol, "WTHG");
        assert_eq!(
            snapshot.market.unwrap().source_url,
            "https://coingecko.com/en/coins/wrapped-thing"
        );

        let no_base = coin_detail("x", dec!(100), dec!(1), None, &[("0X1234", "Uniswap")]);
        assert_eq!(coin_snapshot("XYZ", no_base).symbol, "XYZ");
    }

    #[tokio::test]
    async fn test_resolves_by_symbol() {
        let f = fixture(bitcoin_market(), MockLiveQuotes::new(), MockEquityQuotes::new()).await;

        let snapshot = f.resolver.resolve("btc", Majority::Unknown).await;

        assert_eq!(snapshot.symbol, "BTC");
        assert_eq!(snapshot.source_kind, SourceKind::Crypto);
        let market = snapshot.market.unwrap();
        assert!(market.exchanges.contains("binance"));
        assert!(market.exchanges.contains("coinbase"));
        assert_eq!(market.regular_change(), Some(dec!(1.5)));
        assert_eq!(f.live.calls(), 0);
        assert_eq!(f.equity.calls(), 0);
    }

    #[tokio::test]
    async fn test_pair_ticker_is_stripped() {
        let f = fixture(bitcoin_market(), MockLiveQuotes::new(), MockEquityQuotes::new()).await;

        let snapshot = f.resolver.resolve("BTCUSDT", Majority::Crypto).await;
        assert_eq!(snapshot.symbol, "BTC");
        assert_eq!(f.crypto.requested(), vec!["bitcoin".to_string()]);
    }

    #[tokio::test]
    async fn test_ambiguous_symbol_picks_highest_volume() {
        let crypto = MockCryptoMarket::new()
            .with_coin(
                listing("unicorn-token", "uni", "Unicorn"),
                coin_detail("unicorn-token", dec!(10), dec!(0.01), Some(dec!(0)), &[("UNI", "Gate.io")]),
            )
            .with_failing_coin(listing("uni-broken", "uni", "Broken Uni"))
            .with_coin(
                listing("uniswap", "uni", "Uniswap"),
                coin_detail("uniswap", dec!(500000000), dec!(9), Some(dec!(-2)), &[("UNI", "Binance")]),
            );
        let f = fixture(crypto, MockLiveQuotes::new(), MockEquityQuotes::new()).await;

        let snapshot = f.resolver.resolve("UNI", Majority::Unknown).await;

        assert_eq!(
            snapshot.market.unwrap().source_url,
            "https://coingecko.com/en/coins/uniswap"
        );
        assert_eq!(f.crypto.detail_calls(), 3);
    }

    #[tokio::test]
    async fn test_falls_back_to_live_quote() {
        let crypto = MockCryptoMarket::new().with_coin(
            listing("pepe-fake", "pepe", "Pepe Fake"),
            coin_detail("pepe-fake", dec!(120), dec!(0.0001), None, &[]),
        );
        let live = MockLiveQuotes::new().with_quote("PEPE", live_quote("PEPEUSDT", "BINANCE", dec!(0.00001), dec!(2000000)));
        let f = fixture(crypto, live, MockEquityQuotes::new()).await;

        let snapshot = f.resolver.resolve("pepe", Majority::Unknown).await;

        assert_eq!(snapshot.symbol, "PEPE");
        assert_eq!(snapshot.source_kind, SourceKind::Crypto);
        let market = snapshot.market.unwrap();
        assert_eq!(market.technical_indicator.as_deref(), Some("Buy"));
        assert!(market.exchanges.contains("binance"));
        assert_eq!(f.live.calls(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_coin_id() {
        let f = fixture(bitcoin_market(), MockLiveQuotes::new(), MockEquityQuotes::new()).await;

        let snapshot = f.resolver.resolve("BITCOIN", Majority::Unknown).await;

        assert_eq!(snapshot.symbol, "BTC");
        assert_eq!(f.crypto.requested(), vec!["bitcoin".to_string()]);
        assert_eq!(f.equity.calls(), 0);
    }

    #[tokio::test]
    async fn test_live_source_failure_degrades() {
        let f = fixture(bitcoin_market(), MockLiveQuotes::unavailable(), MockEquityQuotes::new()).await;

        let snapshot = f.resolver.resolve("BITCOIN", Majority::Unknown).await;
        assert!(snapshot.is_resolved());
        assert_eq!(f.live.calls(), 1);
    }

    #[tokio::test]
    async fn test_equity_hint_tries_equities_first() {
        let equity = MockEquityQuotes::new().with_quote("AAPL", equity_quote("AAPL", dec!(190), dec!(1.1), dec!(9000000000)));
        let f = fixture(bitcoin_market(), MockLiveQuotes::new(), equity).await;

        let snapshot = f.resolver.resolve("aapl", Majority::Equity).await;

        assert_eq!(snapshot.symbol, "AAPL");
        assert_eq!(snapshot.source_kind, SourceKind::Equity);
        assert_eq!(f.live.calls(), 0);
        assert_eq!(f.crypto.detail_calls(), 0);
    }

    #[tokio::test]
    async fn test_tied_counts_keep_crypto_first() {
        let crypto = MockCryptoMarket::new().with_coin(
            listing("coin-token", "coin", "Coin Token"),
            coin_detail("coin-token", dec!(900000), dec!(2), Some(dec!(0.4)), &[("COIN", "KuCoin")]),
        );
        let equity = MockEquityQuotes::new()
            .with_quote("COIN", equity_quote("COIN", dec!(230), dec!(2.5), dec!(700000000)));
        let f = fixture(crypto, MockLiveQuotes::new(), equity).await;

        let snapshot = f.resolver.resolve("COIN", Majority::from_counts(1, 1)).await;

        assert_eq!(snapshot.source_kind, SourceKind::Crypto);
        assert_eq!(f.equity.calls(), 0);
    }

    #[tokio::test]
    async fn test_equity_after_crypto_chain_without_hint() {
        let equity = MockEquityQuotes::new().with_quote("TSLA", equity_quote("TSLA", dec!(250), dec!(-3), dec!(5000000000)));
        let f = fixture(bitcoin_market(), MockLiveQuotes::new(), equity).await;

        let snapshot = f.resolver.resolve("TSLA", Majority::Crypto).await;

        assert_eq!(snapshot.source_kind, SourceKind::Equity);
        assert_eq!(f.live.calls(), 1);
        assert_eq!(f.equity.calls(), 1);
    }

    #[tokio::test]
    async fn test_partial_result_when_nothing_good_enough() {
        let crypto = MockCryptoMarket::new().with_coin(
            listing("tiny", "tiny", "Tiny"),
            coin_detail("tiny", dec!(1000), dec!(0.5), None, &[("TINY", "Uniswap")]),
        );
        let f = fixture(crypto, MockLiveQuotes::new(), MockEquityQuotes::new()).await;

        let snapshot = f.resolver.resolve("TINY", Majority::Unknown).await;

        assert!(snapshot.is_resolved());
        assert_eq!(snapshot.market.unwrap().volume, dec!(1000));
        assert_eq!(f.equity.calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_volume_is_unresolved() {
        let crypto = MockCryptoMarket::new().with_coin(
            listing("ghost", "ghost", "Ghost"),
            coin_detail("ghost", dec!(0), dec!(0), None, &[]),
        );
        let f = fixture(crypto, MockLiveQuotes::new(), MockEquityQuotes::new()).await;

        let snapshot = f.resolver.resolve("ghost", Majority::Unknown).await;

        assert_eq!(snapshot.symbol, "GHOST");
        assert_eq!(snapshot.source_kind, SourceKind::Unresolved);
        assert!(snapshot.market.is_none());
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_unresolved() {
        let f = fixture(MockCryptoMarket::new(), MockLiveQuotes::new(), MockEquityQuotes::new()).await;
        let snapshot = f.resolver.resolve("NOPE", Majority::Unknown).await;
        assert!(!snapshot.is_resolved());
        assert!(snapshot.market.is_none());
    }

    #[tokio::test]
    async fn test_resolved_symbols_are_uppercase() {
        let crypto = MockCryptoMarket::new().with_coin(
            listing("dogecoin", "doge", "Dogecoin"),
            coin_detail("dogecoin", dec!(900000000), dec!(0.1), Some(dec!(4)), &[("doge", "Binance")]),
        );
        let f = fixture(crypto, MockLiveQuotes::new(), MockEquityQuotes::new()).await;

        let snapshot = f.resolver.resolve("Doge", Majority::Unknown).await;
        assert!(!snapshot.symbol.is_empty());
        assert_eq!(snapshot.symbol, snapshot.symbol.to_uppercase());
    }

    #[test]
    fn test_asset_table_lookups() {
        let table = AssetTable::from_listings(vec![
            listing("bitcoin", "btc", "Bitcoin"),
            listing("batcat", "btc", "Batcat"),
            listing("ethereum", "eth", "Ethereum"),
        ]);

        assert_eq!(table.len(), 3);
        assert_eq!(table.ids_for_symbol("BTC"), vec!["bitcoin", "batcat"]);
        assert!(table.ids_for_symbol("DOGE").is_empty());
        assert!(table.contains_id("ethereum"));
        assert_eq!(table.id_for_name("Ethereum"), Some("ethereum"));
        assert_eq!(table.id_for_name("ETHEREUM"), None);
    }

    #[tokio::test]
    async fn test_asset_table_refresh() {
        let shared = AssetTable::default().into_shared();
        assert!(shared.read().is_empty());

        let count = refresh(&shared, &bitcoin_market()).await.unwrap();
        assert_eq!(count, 1);
        assert!(shared.read().contains_id("bitcoin"));
    }
}
