//! The read path shared by `read` commands, the read that follows a new
//! subscription, and scheduled subscription ticks.

use owbridge_domain::address::DeviceAddress;
use owbridge_domain::attribute::Attribute;
use owbridge_domain::error::{ErrorKind, GatewayError};
use owbridge_domain::family::FamilyCode;
use owbridge_domain::request::{Action, Target};
use owbridge_domain::response::{DeviceReport, Envelope};

use crate::context::GatewayContext;
use crate::ports::{OneWireBus, StatusSink};
use crate::registry::Sample;

impl<B: OneWireBus, S: StatusSink> GatewayContext<B, S> {
    /// Read `attribute` from `target` and build the `read` envelope.
    ///
    /// Never fails: unsupported attributes and bus failures come back as
    /// `error` envelopes. An absent device is a valid outcome.
    pub async fn read(&self, target: Target, attribute: Attribute) -> Envelope {
        match target {
            Target::Device(address) => self.read_device(address, attribute).await,
            Target::Family(family) => self.read_family(family, attribute).await,
        }
    }

    async fn read_device(&self, address: DeviceAddress, attribute: Attribute) -> Envelope {
        if !address.family_code().supports(attribute) {
            tracing::debug!(device_id = %address, %attribute, "attribute not supported by family");
            return Envelope::error(ErrorKind::UnsupportedAttribute, None);
        }
        match self.registry().sample(address, attribute).await {
            Ok(None) => Envelope::device(Action::Read, DeviceReport::presence(address, None, false)),
            Ok(Some(sample)) => Envelope::device(Action::Read, report(address, attribute, sample).with_presence()),
            Err(err) => read_failed(&err),
        }
    }

    async fn read_family(&self, family: FamilyCode, attribute: Attribute) -> Envelope {
        if !family.supports(attribute) {
            return Envelope::devices(Action::Read, Some(family), Vec::new());
        }
        let mut reports = Vec::new();
        for address in self.registry().devices_of(family) {
            match self.registry().sample(address, attribute).await {
                Ok(Some(sample)) => reports.push(report(address, attribute, sample)),
                Ok(None) => {}
                Err(err) => return read_failed(&err),
            }
        }
        Envelope::devices(Action::Read, Some(family), reports)
    }
}

fn report(address: DeviceAddress, attribute: Attribute, sample: Sample) -> DeviceReport {
    match sample.value {
        Some(value) => DeviceReport::sampled(address, sample.channel, attribute, value),
        None => DeviceReport::presence(address, Some(sample.channel), true),
    }
}

fn read_failed(err: &GatewayError) -> Envelope {
    tracing::error!(error = %err, "1-Wire read failed");
    Envelope::error(ErrorKind::ReadFailed, None)
}
