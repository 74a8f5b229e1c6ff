use growzone_core::{
    analysis::summarize_log, scenario::load_scenario, GrowzoneError, SimulationBuilder,
};
use growzone_schemas::{
    command::{Command, ScheduledCommand},
    config::{ClimateControllerConfig, MixingConfig, SimulationConfig},
    device::{ClimateSettings, DeviceInstance, DeviceKind, DeviceStatus, LightingSettings},
    environment::{ZoneEnvironment, ZoneGeometry, ZoneResources},
    event::PlantEvent,
    file_formats::ZoneSpec,
    plant::{PlantStage, Planting},
    strain::StrainProfile,
};

fn basil() -> StrainProfile {
    let yaml = r#"
id: basil
name: Genovese Basil
resilience: 0.5
leaf_area_index: 2.5
environmental_preferences:
  ideal_temperature: { vegetation: { min: 21, max: 27 } }
  ideal_humidity: { vegetation: { min: 0.45, max: 0.75 } }
  light_intensity: { vegetation: { min: 300, max: 600 } }
growth_model:
  max_biomass_dry_g: 60
  light_use_efficiency_g_per_mol: 0.9
  phase_cap_multipliers: { seedling: 0.1, vegetation: 0.6, flowering: 0.9, ripening: 1.0 }
water_demand:
  daily_liters_per_m2: { vegetation: 3.0 }
  minimum_fraction_required: 0.2
nutrient_demand:
  daily_grams: { vegetation: { nitrogen: 0.2, phosphorus: 0.05, potassium: 0.25 } }
stage_change_thresholds:
  vegetative: { min_light_hours: 20 }
"#;
    serde_yaml::from_str(yaml).unwrap()
}

/// 4500 µmol over 1 m² of a 10 m² zone gives 450 PPFD, the midpoint of basil's band.
fn lamp(id: &str) -> DeviceInstance {
    DeviceInstance {
        id: id.into(),
        name: "LED bar".into(),
        status: DeviceStatus::Operational,
        efficiency: 1.0,
        kind: DeviceKind::Lighting(LightingSettings {
            power_kw: 0.6,
            ppfd: 4500.0,
            coverage_area_m2: 1.0,
            heat_fraction: 0.4,
        }),
    }
}

fn planting(id: &str, stage: PlantStage) -> Planting {
    Planting {
        id: id.into(),
        strain_id: "basil".into(),
        stage,
        biomass_dry_g: 5.0,
        canopy_area_m2: Some(0.25),
        total_light_hours: 0.0,
    }
}

fn zone(id: &str, devices: Vec<DeviceInstance>, plants: Vec<Planting>) -> ZoneSpec {
    ZoneSpec {
        id: id.into(),
        name: format!("Zone {id}"),
        geometry: ZoneGeometry::new(10.0, 3.0),
        environment: ZoneEnvironment {
            temperature_c: 25.0,
            relative_humidity: 0.6,
            co2_ppm: 800.0,
            ppfd: 0.0,
        },
        resources: ZoneResources::default(),
        devices,
        plants,
    }
}

fn still_air() -> SimulationConfig {
    SimulationConfig {
        mixing: MixingConfig {
            temperature_rate_per_hour: 0.0,
            humidity_rate_per_hour: 0.0,
            co2_rate_per_hour: 0.0,
            temperature_airflow_factor: 0.0,
            humidity_airflow_factor: 0.0,
            co2_airflow_factor: 0.0,
            passive_air_changes_per_hour: 0.0,
        },
        ..SimulationConfig::default()
    }
}

fn temp_log_path(name: &str) -> String {
    let mut path = std::env::temp_dir();
    path.push(format!("growzone-{}-{}.csv", name, std::process::id()));
    path.to_string_lossy().into_owned()
}

#[test]
fn lamp_warms_the_zone_and_lights_its_coverage() {
    let mut engine = SimulationBuilder::new()
        .with_zone(zone("lit", vec![lamp("lamp-1")], vec![]))
        .with_zone(zone("dark", vec![], vec![]))
        .build()
        .unwrap();

    assert!(engine.tick().unwrap());

    let lit = engine.get_zone("lit").unwrap();
    let dark = engine.get_zone("dark").unwrap();
    assert!(lit.environment.temperature_c > dark.environment.temperature_c);
    assert!((lit.environment.ppfd - 450.0).abs() < 1e-9);
    assert_eq!(dark.environment.ppfd, 0.0);
    assert!((lit.energy_kwh_total - 0.6).abs() < 1e-9);
}

#[test]
fn controller_heats_a_cold_zone_toward_its_setpoint_without_overshoot() {
    let heater = DeviceInstance {
        id: "hvac-1".into(),
        name: "Split unit".into(),
        status: DeviceStatus::Operational,
        efficiency: 1.0,
        kind: DeviceKind::ClimateControl(ClimateSettings {
            power_kw: 0.5,
            cooling_capacity_kw: None,
            heating_capacity_kw: Some(0.5),
            target_temperature_c: Some(24.0),
            target_temperature_range: None,
            hysteresis_k: 1.0,
            full_power_at_delta_k: 2.0,
            airflow_m3_per_h: 0.0,
        }),
    };
    let mut cold = zone("z-1", vec![heater], vec![]);
    cold.environment.temperature_c = 15.0;
    let config = SimulationConfig {
        climate_controller: Some(ClimateControllerConfig::default()),
        ..still_air()
    };
    let mut engine = SimulationBuilder::new()
        .with_config(config)
        .with_zone(cold)
        .with_tick_limit(16)
        .build()
        .unwrap();
    assert!(engine.get_zone("z-1").unwrap().controller.is_some());

    let mut temperatures = vec![15.0];
    while engine.tick().unwrap() {
        temperatures.push(engine.get_zone("z-1").unwrap().environment.temperature_c);
    }

    assert_eq!(temperatures.len(), 17);
    assert!(temperatures[1] > temperatures[0]);
    for pair in temperatures.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-9, "temperature fell: {:?}", temperatures);
    }
    assert!(temperatures.iter().all(|t| *t <= 24.0 + 1e-9), "overshoot: {:?}", temperatures);
    assert!(*temperatures.last().unwrap() > 22.0);
    assert!(engine.get_zone("z-1").unwrap().energy_kwh_total > 0.0);
}

#[test]
fn water_shortage_slows_growth_and_transpiration() {
    let dry_resources = ZoneResources {
        water_liters: 0.0,
        ..ZoneResources::default()
    };
    let wet = zone("wet", vec![lamp("lamp-wet")], vec![planting("p-wet", PlantStage::Vegetative)]);
    let dry = ZoneSpec {
        resources: dry_resources,
        ..zone("dry", vec![lamp("lamp-dry")], vec![planting("p-dry", PlantStage::Vegetative)])
    };
    let mut engine = SimulationBuilder::new()
        .with_strains([basil()])
        .with_zones(vec![wet, dry])
        .build()
        .unwrap();

    engine.tick().unwrap();

    let wet_plant = &engine.get_plant("p-wet").unwrap().state;
    let dry_plant = &engine.get_plant("p-dry").unwrap().state;
    assert!(wet_plant.last_photosynthesis_g > 0.0);
    assert!(dry_plant.last_photosynthesis_g < wet_plant.last_photosynthesis_g);
    assert!(dry_plant.health < wet_plant.health);
    assert!(dry_plant.transpired_liters_total < wet_plant.transpired_liters_total);

    let reports = engine.get_last_reports();
    let wet_report = reports.iter().find(|r| r.zone_id == "wet").unwrap();
    assert!(wet_report.transpiration_liters > 0.0);
    assert!(wet_report.water_liters < ZoneResources::default().water_liters);
}

#[test]
fn seedling_short_of_light_reaches_vegetative_after_a_lit_tick() {
    let seedling = Planting {
        total_light_hours: 19.0,
        ..planting("p-1", PlantStage::Seedling)
    };
    let config = SimulationConfig {
        tick_length_minutes: 240.0,
        ..SimulationConfig::default()
    };
    let mut engine = SimulationBuilder::new()
        .with_config(config)
        .with_strains([basil()])
        .with_zone(zone("z-1", vec![lamp("lamp-1")], vec![seedling]))
        .build()
        .unwrap();

    engine.tick().unwrap();

    let record = engine.get_plant("p-1").unwrap();
    assert_eq!(record.state.stage, PlantStage::Vegetative);
    assert_eq!(record.phenology.stage, PlantStage::Vegetative);
    assert_eq!(record.phenology.hours_in_stage, 0.0);
    assert_eq!(record.phenology.light_hours_in_stage, 0.0);
    assert_eq!(record.phenology.stress_integral, 0.0);
    assert!(record.phenology.total_light_hours >= 20.0);

    let changed = engine.get_events().iter().any(|e| {
        matches!(
            &e.payload,
            PlantEvent::StageChanged { plant_id, from: PlantStage::Seedling, to: PlantStage::Vegetative, .. }
                if plant_id == "p-1"
        )
    });
    assert!(changed);
}

#[test]
fn seedling_stays_put_in_the_dark() {
    let seedling = Planting {
        total_light_hours: 19.0,
        ..planting("p-1", PlantStage::Seedling)
    };
    let mut engine = SimulationBuilder::new()
        .with_strains([basil()])
        .with_zone(zone("z-1", vec![], vec![seedling]))
        .build()
        .unwrap();

    engine.tick().unwrap();

    let record = engine.get_plant("p-1").unwrap();
    assert_eq!(record.state.stage, PlantStage::Seedling);
    assert_eq!(record.phenology.total_light_hours, 19.0);
}

#[test]
fn transpired_water_reaches_the_air_one_tick_later() {
    let mut engine = SimulationBuilder::new()
        .with_config(still_air())
        .with_strains([basil()])
        .with_zone(zone("z-1", vec![], vec![planting("p-1", PlantStage::Vegetative)]))
        .build()
        .unwrap();

    engine.tick().unwrap();
    let zone = engine.get_zone("z-1").unwrap();
    assert_eq!(zone.environment.relative_humidity, 0.6);
    assert!(zone.pending_influx_liters > 0.0);
    let pending = zone.pending_influx_liters;

    engine.tick().unwrap();
    let zone = engine.get_zone("z-1").unwrap();
    assert!(zone.environment.relative_humidity > 0.6);
    assert!(zone.water_consumed_liters_total >= pending);
}

#[test]
fn nearly_empty_reservoir_returns_no_more_vapour_than_it_gave() {
    let mut layout = zone("z-1", vec![lamp("lamp-1")], vec![planting("p-1", PlantStage::Vegetative)]);
    layout.resources.water_liters = 0.02;
    let mut engine = SimulationBuilder::new()
        .with_strains([basil()])
        .with_zone(layout)
        .build()
        .unwrap();

    engine.tick().unwrap();

    let zone = engine.get_zone("z-1").unwrap();
    assert!(zone.pending_influx_liters > 0.0);
    assert!(zone.pending_influx_liters <= zone.water_consumed_liters_total);
    assert!(zone.water_consumed_liters_total <= 0.02 + 1e-12);
    assert!(zone.resources.water_liters >= 0.0);
    let plant = &engine.get_plant("p-1").unwrap().state;
    assert!(plant.transpired_liters_total <= 0.02 + 1e-12);
}

#[test]
fn scheduled_commands_run_before_their_tick() {
    let commands = vec![
        ScheduledCommand {
            tick: 2,
            command: Command::SetDeviceStatus {
                zone_id: "z-1".into(),
                device_id: "lamp-1".into(),
                status: DeviceStatus::Broken,
            },
        },
        ScheduledCommand {
            tick: 3,
            command: Command::RemovePlant {
                plant_id: "p-1".into(),
            },
        },
    ];
    let mut engine = SimulationBuilder::new()
        .with_strains([basil()])
        .with_zone(zone("z-1", vec![lamp("lamp-1")], vec![planting("p-1", PlantStage::Vegetative)]))
        .with_scheduled_commands(commands)
        .build()
        .unwrap();

    engine.tick().unwrap();
    assert!(engine.get_zone("z-1").unwrap().environment.ppfd > 0.0);

    engine.tick().unwrap();
    assert_eq!(engine.get_zone("z-1").unwrap().environment.ppfd, 0.0);
    assert!(engine.get_plant("p-1").is_some());

    engine.tick().unwrap();
    assert!(engine.get_plant("p-1").is_none());
    assert!(engine.get_zone("z-1").unwrap().plant_ids.is_empty());
    assert_eq!(engine.get_last_reports()[0].plant_count, 0);
}

#[test]
fn scheduled_commands_with_unknown_targets_are_rejected_at_build() {
    let ghost = SimulationBuilder::new()
        .with_strains([basil()])
        .with_zone(zone("z-1", vec![lamp("lamp-1")], vec![planting("p-1", PlantStage::Vegetative)]))
        .with_scheduled_commands(vec![
            ScheduledCommand {
                tick: 2,
                command: Command::RemovePlant { plant_id: "ghost".into() },
            },
            ScheduledCommand {
                tick: 2,
                command: Command::SetDeviceStatus {
                    zone_id: "z-1".into(),
                    device_id: "lamp-1".into(),
                    status: DeviceStatus::Broken,
                },
            },
        ])
        .with_tick_limit(5)
        .build();
    assert!(matches!(ghost, Err(GrowzoneError::PlantNotFound(id)) if id == "ghost"));

    let missing_device = SimulationBuilder::new()
        .with_zone(zone("z-1", vec![lamp("lamp-1")], vec![]))
        .with_scheduled_commands(vec![ScheduledCommand {
            tick: 1,
            command: Command::SetDeviceEfficiency {
                zone_id: "z-1".into(),
                device_id: "fan-9".into(),
                efficiency: 0.5,
            },
        }])
        .build();
    assert!(matches!(missing_device, Err(GrowzoneError::DeviceNotFound { .. })));

    let missing_zone = SimulationBuilder::new()
        .with_zone(zone("z-1", vec![], vec![]))
        .with_scheduled_commands(vec![ScheduledCommand {
            tick: 1,
            command: Command::RefillReservoir {
                zone_id: "nowhere".into(),
                water_liters: 10.0,
                nutrient_solution_liters: 0.0,
            },
        }])
        .build();
    assert!(matches!(missing_zone, Err(GrowzoneError::ZoneNotFound(id)) if id == "nowhere"));
}

#[test]
fn stale_scheduled_command_does_not_stop_the_run() {
    let remove = || ScheduledCommand {
        tick: 2,
        command: Command::RemovePlant { plant_id: "p-1".into() },
    };
    let mut engine = SimulationBuilder::new()
        .with_strains([basil()])
        .with_zone(zone("z-1", vec![lamp("lamp-1")], vec![planting("p-1", PlantStage::Vegetative)]))
        .with_scheduled_commands(vec![
            remove(),
            remove(),
            ScheduledCommand {
                tick: 2,
                command: Command::SetDeviceStatus {
                    zone_id: "z-1".into(),
                    device_id: "lamp-1".into(),
                    status: DeviceStatus::Broken,
                },
            },
        ])
        .with_tick_limit(5)
        .build()
        .unwrap();

    engine.run().unwrap();

    assert_eq!(engine.get_tick(), 5);
    assert!(engine.get_plant("p-1").is_none());
    assert_eq!(engine.get_zone("z-1").unwrap().environment.ppfd, 0.0);
}

#[test]
fn refill_respects_reservoir_capacity() {
    let mut spec = zone("z-1", vec![], vec![]);
    spec.resources.water_liters = 40.0;
    let mut engine = SimulationBuilder::new().with_zone(spec).build().unwrap();

    engine
        .execute_command(Command::RefillReservoir {
            zone_id: "z-1".into(),
            water_liters: 500.0,
            nutrient_solution_liters: 0.0,
        })
        .unwrap();

    let resources = &engine.get_zone("z-1").unwrap().resources;
    assert_eq!(resources.water_liters, resources.reservoir_capacity_liters);
}

#[test]
fn commands_for_unknown_targets_fail() {
    let mut engine = SimulationBuilder::new()
        .with_zone(zone("z-1", vec![lamp("lamp-1")], vec![]))
        .build()
        .unwrap();

    let missing_zone = engine.execute_command(Command::SetNutrientStrength {
        zone_id: "nowhere".into(),
        strength: 0.5,
    });
    assert!(matches!(missing_zone, Err(GrowzoneError::ZoneNotFound(id)) if id == "nowhere"));

    let missing_device = engine.execute_command(Command::SetDeviceStatus {
        zone_id: "z-1".into(),
        device_id: "fan-9".into(),
        status: DeviceStatus::Offline,
    });
    assert!(matches!(missing_device, Err(GrowzoneError::DeviceNotFound { .. })));

    let missing_plant = engine.execute_command(Command::RemovePlant {
        plant_id: "ghost".into(),
    });
    assert!(matches!(missing_plant, Err(GrowzoneError::PlantNotFound(_))));
}

#[test]
fn build_rejects_bad_layouts() {
    let no_zones = SimulationBuilder::new().build();
    assert!(matches!(no_zones, Err(GrowzoneError::NoZonesProvided)));

    let unknown_strain = SimulationBuilder::new()
        .with_zone(zone("z-1", vec![], vec![planting("p-1", PlantStage::Seedling)]))
        .build();
    assert!(matches!(
        unknown_strain,
        Err(GrowzoneError::StrainNotFound { plant_id, strain_id }) if plant_id == "p-1" && strain_id == "basil"
    ));

    let duplicate = SimulationBuilder::new()
        .with_strains([basil()])
        .with_zone(zone("a", vec![], vec![planting("p-1", PlantStage::Seedling)]))
        .with_zone(zone("b", vec![], vec![planting("p-1", PlantStage::Seedling)]))
        .build();
    assert!(matches!(duplicate, Err(GrowzoneError::DuplicateId { kind: "plant", .. })));

    let zero_tick = SimulationBuilder::new()
        .with_config(SimulationConfig {
            tick_length_minutes: 0.0,
            ..SimulationConfig::default()
        })
        .with_zone(zone("z-1", vec![], vec![]))
        .build();
    assert!(matches!(zero_tick, Err(GrowzoneError::ConfigError(_))));
}

#[test]
fn run_needs_a_tick_limit() {
    let mut engine = SimulationBuilder::new()
        .with_zone(zone("z-1", vec![], vec![]))
        .build()
        .unwrap();
    assert!(matches!(engine.run(), Err(GrowzoneError::ConfigError(_))));
}

#[test]
fn day_long_run_logs_every_tick() {
    let log_path = temp_log_path("day-run");
    let mut engine = SimulationBuilder::new()
        .with_strains([basil()])
        .with_zone(zone(
            "z-1",
            vec![lamp("lamp-1")],
            vec![planting("p-1", PlantStage::Vegetative), planting("p-2", PlantStage::Vegetative)],
        ))
        .with_tick_limit(24)
        .with_timeseries_logging_to_file(&log_path)
        .build()
        .unwrap();

    engine.run().unwrap();
    assert_eq!(engine.get_tick(), 24);
    assert!(!engine.tick().unwrap());

    let summary = summarize_log(&log_path).unwrap();
    let zone = &summary.zones["z-1"];
    assert_eq!(summary.total_ticks, 24);
    assert_eq!(zone.ticks, 24);
    assert!((zone.total_energy_kwh - 24.0 * 0.6).abs() < 1e-6);
    assert!(zone.total_transpiration_liters > 0.0);
    assert!(zone.final_biomass_g > 10.0);

    let _ = std::fs::remove_file(&log_path);
}

#[test]
fn bundled_scenario_builds_and_runs() {
    let scenario_path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/scenarios/basil_tent.yaml");
    let strain_path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/knowledge_base/strains/herbs.yaml");
    let scenario = load_scenario(scenario_path).unwrap();
    let strains = growzone_core::scenario::load_strain_file(strain_path).unwrap();

    let mut engine = SimulationBuilder::from_scenario(scenario)
        .with_strains(strains.strains)
        .with_tick_limit(48)
        .build()
        .unwrap();
    engine.run().unwrap();

    assert_eq!(engine.get_tick(), 48);
    for report in engine.get_last_reports() {
        assert!(report.environment.relative_humidity >= 0.0);
        assert!(report.environment.relative_humidity <= 1.0);
        assert!(report.total_biomass_g > 0.0);
    }
}
