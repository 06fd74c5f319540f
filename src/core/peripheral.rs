use crate::filter::Advertisement;

pub(crate) trait PeripheralExt: btleplug::api::Peripheral {
    async fn advertisement(&self) -> btleplug::Result<Option<Advertisement>> {
        let properties = self.properties().await?;

        Ok(properties.map(|p| Advertisement {
            local_name: p.local_name,
            address: p.address,
            rssi: p.rssi,
            manufacturer_data: p.manufacturer_data,
        }))
    }
}

impl<T: btleplug::api::Peripheral> PeripheralExt for T {}
