#[cfg(test)]
mod vlan_workflow_tests {
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    use wg_vlan::commands::{self, ClientKey, InitOptions, OutputFormat, Target};
    use wg_vlan::keys::{derive_public_key_base64, generate_key_pair};
    use wg_vlan::render::{render_client_config, render_server_config, PeerConfig};
    use wg_vlan::vlan::{load_vlan, save_vlan, Position, Vlan, VlanError, VlanServer};

    fn vlan_with_endpoint(network: &str) -> Vlan {
        Vlan::new(VlanServer::new("hub", network, 51820).unwrap())
            .with_public_endpoint("vpn.example.com:51820")
    }

    /// init, add clients through the command layer, then print every config
    #[test]
    fn test_init_add_print_cycle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("office.yaml");

        let options = InitOptions {
            public_endpoint: "vpn.example.com:51820".to_string(),
            clients: vec!["laptop".to_string()],
            ..InitOptions::default()
        };
        commands::init(&path, &options).unwrap();
        commands::client_add(&path, "desk", &ClientKey::Generate).unwrap();

        let mut out = Vec::new();
        commands::print(&path, &Target::Server, OutputFormat::Text, &mut out).unwrap();
        let server: PeerConfig = String::from_utf8(out).unwrap().parse().unwrap();
        let names: Vec<_> = server.peers().iter().filter_map(|p| p.name()).collect();
        assert_eq!(names, vec!["laptop", "desk"]);

        let vlan = load_vlan(&path).unwrap();
        for client in &vlan.clients {
            let mut out = Vec::new();
            commands::print(
                &path,
                &Target::Client(client.peer_name.clone()),
                OutputFormat::Text,
                &mut out,
            )
            .unwrap();
            let config: PeerConfig = String::from_utf8(out).unwrap().parse().unwrap();

            // The client's view of the server matches the server's view of the client
            let server_side = server.peer(&client.peer_name).unwrap();
            let client_side = &config.peers()[0];
            assert_eq!(
                server_side.get("PresharedKey"),
                client_side.get("PresharedKey")
            );
            assert_eq!(
                derive_public_key_base64(config.interface().get("PrivateKey").unwrap()).unwrap(),
                server_side.get("PublicKey").unwrap()
            );
            assert_eq!(
                derive_public_key_base64(server.interface().get("PrivateKey").unwrap()).unwrap(),
                client_side.get("PublicKey").unwrap()
            );
            assert_eq!(
                config.interface().get("Address"),
                server_side.get("AllowedIPs")
            );
        }
    }

    /// Sequential allocation and duplicate rejection in a /24
    #[test]
    fn test_sequential_allocation_scenario() {
        let mut vlan = vlan_with_endpoint("10.20.30.1/24");
        assert_eq!(vlan.add_client("a", None).unwrap().network, "10.20.30.2");
        assert_eq!(vlan.add_client("b", None).unwrap().network, "10.20.30.3");

        let before = vlan.clone();
        assert!(matches!(
            vlan.add_client("a", None),
            Err(VlanError::DuplicateName(_))
        ));
        assert_eq!(vlan, before);
    }

    /// A /30 has room for the server and one client
    #[test]
    fn test_slash_30_exhaustion_scenario() {
        let mut vlan = vlan_with_endpoint("10.0.0.1/30");
        vlan.add_client("only", None).unwrap();
        let err = vlan.add_client("extra", None).unwrap_err();
        assert!(matches!(err, VlanError::Allocation(_)));
        assert!(err.to_string().contains("10.0.0.1/30"));
    }

    /// IPv6 VLANs allocate the same way
    #[test]
    fn test_ipv6_vlan() {
        let mut vlan = vlan_with_endpoint("fd00:20::1/64");
        assert_eq!(vlan.add_client("a", None).unwrap().network, "fd00:20::2");
        assert_eq!(vlan.add_client("b", None).unwrap().network, "fd00:20::3");

        let config = render_client_config(&vlan, "b").unwrap();
        assert_eq!(config.interface().get("Address"), Some("fd00:20::3/128"));
        assert_eq!(config.peers()[0].get("AllowedIPs"), Some("fd00:20::/64"));
    }

    /// A client holding only its public key validates and renders on the server side
    #[test]
    fn test_public_key_only_client() {
        let mut vlan = vlan_with_endpoint("10.20.30.1/24");
        let (_, public) = generate_key_pair().unwrap();
        vlan.add_client_with_public_key("phone", &public.to_base64())
            .unwrap();

        let report = vlan.validate();
        assert!(report.is_ok());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("private key unset")));

        let server = render_server_config(&vlan).unwrap();
        assert_eq!(
            server.peer("phone").unwrap().get("PublicKey"),
            Some(public.to_base64().as_str())
        );
        assert!(matches!(
            render_client_config(&vlan, "phone"),
            Err(VlanError::MissingPrivateKey(_))
        ));
    }

    /// Every structural error in a hand-edited document is reported at once
    #[test]
    fn test_hand_edited_document_errors_aggregate() {
        let mut vlan = vlan_with_endpoint("10.20.30.1/24");
        vlan.add_client("a", None).unwrap();
        vlan.add_client("b", None).unwrap();
        vlan.add_client("c", None).unwrap();

        vlan.clients[1].peer_name = "a".to_string();
        vlan.clients[2].network = "10.20.30.2".to_string();
        vlan.server.listen_port = 0;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            "{}",
            serde_yaml::to_string(&vlan).unwrap()
        )
        .unwrap();

        let err = load_vlan(temp_file.path()).unwrap_err();
        let Some(VlanError::Validation(errors)) = err.downcast_ref::<VlanError>() else {
            panic!("expected aggregate validation error, got {}", err);
        };
        assert!(errors
            .at(Position::Server)
            .any(|e| matches!(e, VlanError::MissingListenPort)));
        assert!(errors
            .at(Position::Client(1))
            .any(|e| matches!(e, VlanError::DuplicateName(name) if name == "a")));
        assert!(errors
            .at(Position::Client(2))
            .any(|e| matches!(e, VlanError::AddressOverlap { .. })));
        assert_eq!(errors.at(Position::Client(0)).count(), 0);
    }

    /// Save and reload keep client order and unknown fields
    #[test]
    fn test_persistence_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vlan.yaml");

        let mut vlan = vlan_with_endpoint("10.20.30.1/24");
        for name in ["zeta", "alpha", "mid"] {
            vlan.add_client(name, None).unwrap();
        }
        vlan.unknown.insert(
            "owner".to_string(),
            serde_yaml::Value::String("netops".to_string()),
        );
        save_vlan(&vlan, &path).unwrap();

        let reloaded = load_vlan(&path).unwrap();
        assert_eq!(reloaded, vlan);
        let names: Vec<_> = reloaded.clients.iter().map(|c| c.peer_name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            serde_yaml::to_string(&reloaded).unwrap()
        );
    }
}
