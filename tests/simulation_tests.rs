#[cfg(test)]
mod simulation_tests {
    use std::io::Write;
    use std::net::Ipv4Addr;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    use lansim::config::Config;
    use lansim::config_loader::load_config;
    use lansim::flow::{DhcpAbort, DhcpOutcome, PingOutcome};
    use lansim::host::{OsVariant, SERVER_ID};
    use lansim::net::{AddressPool, ArpCache, MacAddr, ManualClock};
    use lansim::packet::{Destination, PacketKind};
    use lansim::report::SessionReport;
    use lansim::scenario::ScenarioRunner;
    use lansim::session::Session;

    fn seeded_session(clock: &ManualClock) -> Session {
        let mut config = Config::default();
        config.general.seed = Some(2024);
        Session::with_clock(&config, Box::new(clock.clone()))
    }

    fn kinds(packets: &[lansim::packet::Packet]) -> Vec<PacketKind> {
        packets.iter().map(|p| p.kind).collect()
    }

    /// Server, two clients, one ping: the reference walkthrough
    #[test]
    fn test_reference_walkthrough() {
        let clock = ManualClock::default();
        let mut session = seeded_session(&clock);

        let server = session.host(SERVER_ID).unwrap();
        assert_eq!(server.os, OsVariant::DhcpServer);
        assert_eq!(server.ip_address, Some(Ipv4Addr::new(192, 168, 1, 1)));

        let vm1 = session.add_host(None);
        assert_eq!(vm1.id, 1);
        session.set_os_variant(vm1.id, OsVariant::VariantA).unwrap();
        assert_eq!(session.host(1).unwrap().ip_address, Some(Ipv4Addr::new(192, 168, 1, 11)));

        let vm2 = session.add_host(None);
        assert_eq!(vm2.id, 2);
        session.set_os_variant(vm2.id, OsVariant::VariantB).unwrap();
        assert_eq!(session.host(2).unwrap().ip_address, Some(Ipv4Addr::new(192, 168, 1, 12)));

        let dhcp = &session.packets()[..4];
        assert_eq!(
            dhcp.iter().map(|p| (p.kind, p.from, p.to)).collect::<Vec<_>>(),
            vec![
                (PacketKind::DhcpDiscover, 1, Destination::Broadcast),
                (PacketKind::DhcpOffer, SERVER_ID, Destination::Host(1)),
                (PacketKind::DhcpRequest, 1, Destination::Host(SERVER_ID)),
                (PacketKind::DhcpAcknowledge, SERVER_ID, Destination::Host(1)),
            ]
        );

        session.select_source(1).unwrap();
        session.select_target(2).unwrap();
        assert_eq!(session.ping().unwrap(), PingOutcome::Completed { resolved: true });

        let ping = &session.packets()[8..];
        assert_eq!(
            kinds(ping),
            vec![
                PacketKind::ArpRequest,
                PacketKind::ArpReply,
                PacketKind::IcmpRequest,
                PacketKind::IcmpReply,
            ]
        );
        let last = ping.last().unwrap();
        assert_eq!(last.from, 2);
        assert_eq!(last.to, Destination::Host(1));
    }

    #[test]
    fn test_second_ping_uses_cache_until_expiry() {
        let clock = ManualClock::default();
        let mut session = seeded_session(&clock);
        for os in [OsVariant::VariantA, OsVariant::VariantB] {
            let id = session.add_host(None).id;
            session.set_os_variant(id, os).unwrap();
        }
        session.select_source(1).unwrap();
        session.select_target(2).unwrap();
        session.ping().unwrap();

        clock.advance(Duration::from_millis(299_999));
        let start = session.packets().len();
        assert_eq!(session.ping().unwrap(), PingOutcome::Completed { resolved: false });
        assert_eq!(
            kinds(&session.packets()[start..]),
            vec![PacketKind::IcmpRequest, PacketKind::IcmpReply]
        );

        clock.advance(Duration::from_millis(1));
        let start = session.packets().len();
        assert_eq!(session.ping().unwrap(), PingOutcome::Completed { resolved: true });
        assert_eq!(session.packets().len() - start, 4);
    }

    #[test]
    fn test_ping_without_addresses_is_a_noop() {
        let clock = ManualClock::default();
        let mut config = Config::default();
        config.general.seed = Some(1);
        config.network.pool_start = 11;
        config.network.pool_end = 11;
        config.network.pool_wrap = false;
        let mut session = Session::with_clock(&config, Box::new(clock));

        let a = session.add_host(None).id;
        let b = session.add_host(None).id;
        assert_eq!(
            session.set_os_variant(a, OsVariant::VariantA).unwrap(),
            Some(DhcpOutcome::Assigned(Ipv4Addr::new(192, 168, 1, 11)))
        );
        assert_eq!(
            session.set_os_variant(b, OsVariant::VariantA).unwrap(),
            Some(DhcpOutcome::Aborted(DhcpAbort::PoolExhausted))
        );

        session.select_source(a).unwrap();
        session.select_target(b).unwrap();
        let before = session.packets().len();
        assert!(matches!(session.ping().unwrap(), PingOutcome::Skipped(_)));
        assert_eq!(session.packets().len(), before);
    }

    #[test]
    fn test_removing_server_leaves_registry_unchanged() {
        let clock = ManualClock::default();
        let mut session = seeded_session(&clock);
        session.add_host(Some("lab-1".to_string()));
        let before = session.hosts();

        assert!(!session.remove_host(SERVER_ID));
        assert_eq!(session.hosts(), before);
    }

    #[test]
    fn test_frames_encode_handshake_fields() {
        let clock = ManualClock::default();
        let mut session = seeded_session(&clock);
        let id = session.add_host(None).id;
        session.set_os_variant(id, OsVariant::VariantA).unwrap();

        let packets = session.packets();
        assert!(packets[0].frame.contains("Destination: FF:FF:FF:FF:FF:FF"));
        assert!(packets[0].frame.contains("350101"));
        assert!(packets[1].frame.contains("350102"));
        assert!(packets[2].frame.contains("350103"));
        assert!(packets[3].frame.contains("350105"));
        assert!(packets[3].frame.contains("YIAddr:  C0A8010B"));

        let mac = session.host(id).unwrap().hardware_address.to_string();
        assert!(packets[0].frame.contains(&format!("CHAddr:  {}", mac)));
    }

    #[test]
    fn test_channel_subscriber_receives_packets_in_order() {
        let (tx, rx) = mpsc::channel();
        let clock = ManualClock::default();
        let mut session = seeded_session(&clock);
        session.subscribe(Box::new(tx));

        let id = session.add_host(None).id;
        session.set_os_variant(id, OsVariant::VariantB).unwrap();

        let ids: Vec<u64> = rx.try_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_pool_and_cache_properties() {
        let mut pool = AddressPool::default();
        for expected in (11..=254).chain(11..=20) {
            assert_eq!(pool.preview().map(|ip| ip.octets()[3]), Some(expected));
            assert_eq!(pool.commit().map(|ip| ip.octets()[3]), Some(expected));
        }

        let mut cache = ArpCache::default();
        let ip = Ipv4Addr::new(192, 168, 1, 40);
        let mac: MacAddr = "02:00:5E:10:00:01".parse().unwrap();
        cache.insert(ip, mac, 10);
        assert_eq!(cache.lookup(ip, 10 + 299_999), Some(mac));
        assert_eq!(cache.lookup(ip, 10 + 300_000), None);
    }

    #[test]
    fn test_scenario_file_end_to_end() {
        let yaml = r#"
general:
  seed: 5
network:
  arp_ttl: "1m"
scenario:
  - add_host: { name: "alice" }
  - add_host: { name: "bob" }
  - add_host: { name: "carol" }
  - set_os: { host: 1, os: variant_a }
  - set_os: { host: 2, os: variant_b }
  - set_os: { host: 3, os: variant_a }
  - select: { source: 1, target: 2 }
  - ping
  - select: { source: 3, target: 1 }
  - ping
  - wait: "2m"
  - ping
  - remove_host: 2
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        let mut runner = ScenarioRunner::new(&config);
        let summary = runner.run(config.scenario()).unwrap();

        assert_eq!(summary.addresses_assigned, 3);
        assert_eq!(summary.pings_completed, 3);
        // carol learned alice from the first broadcast, so only the last ping
        // (after the one minute TTL ran out) needs ARP again
        assert_eq!(summary.pings_resolved, 2);

        let session = runner.session();
        assert_eq!(session.hosts().len(), 3);
        assert_eq!(session.packets().len(), 12 + 4 + 2 + 4);

        let report = SessionReport::new(session, Some(summary)).to_text(false);
        assert!(report.contains("ICMP Reply: alice -> carol"));
        assert!(report.contains("host 2"));
    }
}
